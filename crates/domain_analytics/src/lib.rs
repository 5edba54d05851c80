//! Dashboard Analytics
//!
//! A read model over bills, patients and medicines. Nothing here writes:
//! every report is a pure function of the records read from the ports, so
//! an empty store yields zero-valued reports rather than errors.

pub mod window;
pub mod reports;
pub mod error;
pub mod service;

pub use window::{month_start, DateWindow};
pub use reports::{
    percentage_change, revenue_breakdown, revenue_trend, top_medicines, top_services, DailyRevenue,
    DashboardSummary, RevenueBreakdown, TopItem,
};
pub use error::AnalyticsError;
pub use service::AnalyticsService;
