//! Dashboard DTOs

use chrono::NaiveDate;
use core_kernel::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use domain_analytics::{DailyRevenue, DashboardSummary, RevenueBreakdown, TopItem};

/// Days looked back when a report names no window
pub const DEFAULT_REPORT_DAYS: u32 = 30;
/// Rows in a top list when `limit` is absent
pub const DEFAULT_TOP_LIMIT: usize = 5;

/// Either an explicit `from`/`to` day range or the last `days` days
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub days: Option<u32>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummaryResponse {
    pub currency: Currency,
    #[serde(with = "rust_decimal::serde::float")]
    pub today_revenue: Decimal,
    pub today_bills: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub yesterday_revenue: Decimal,
    pub yesterday_bills: u64,
    pub daily_change: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub month_revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub last_month_revenue: Decimal,
    pub monthly_change: i64,
    pub total_patients: u64,
    pub active_patients: u64,
    pub new_patients_this_month: u64,
    pub outstanding_bills: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub outstanding_amount: Decimal,
    pub low_stock_medicines: u64,
    pub out_of_stock_medicines: u64,
    pub expiring_soon_medicines: u64,
}

impl From<DashboardSummary> for DashboardSummaryResponse {
    fn from(summary: DashboardSummary) -> Self {
        DashboardSummaryResponse {
            currency: summary.today_revenue.currency(),
            today_revenue: summary.today_revenue.amount(),
            today_bills: summary.today_bills,
            yesterday_revenue: summary.yesterday_revenue.amount(),
            yesterday_bills: summary.yesterday_bills,
            daily_change: summary.daily_change,
            month_revenue: summary.month_revenue.amount(),
            last_month_revenue: summary.last_month_revenue.amount(),
            monthly_change: summary.monthly_change,
            total_patients: summary.total_patients,
            active_patients: summary.active_patients,
            new_patients_this_month: summary.new_patients_this_month,
            outstanding_bills: summary.outstanding_bills,
            outstanding_amount: summary.outstanding_amount.amount(),
            low_stock_medicines: summary.low_stock_medicines,
            out_of_stock_medicines: summary.out_of_stock_medicines,
            expiring_soon_medicines: summary.expiring_soon_medicines,
        }
    }
}

/// Revenue split by source; shares are whole percentages rounded down
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBreakdownResponse {
    pub currency: Currency,
    #[serde(with = "rust_decimal::serde::float")]
    pub consultation: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub medicines: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub services: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub consultation_share: u32,
    pub medicines_share: u32,
    pub services_share: u32,
    pub bill_count: u64,
}

impl From<RevenueBreakdown> for RevenueBreakdownResponse {
    fn from(breakdown: RevenueBreakdown) -> Self {
        RevenueBreakdownResponse {
            currency: breakdown.total.currency(),
            consultation: breakdown.consultation.amount(),
            medicines: breakdown.medicines.amount(),
            services: breakdown.services.amount(),
            total: breakdown.total.amount(),
            consultation_share: breakdown.consultation_share,
            medicines_share: breakdown.medicines_share,
            services_share: breakdown.services_share,
            bill_count: breakdown.bill_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenueResponse {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    pub bills: u64,
}

impl From<DailyRevenue> for DailyRevenueResponse {
    fn from(day: DailyRevenue) -> Self {
        DailyRevenueResponse {
            date: day.date,
            revenue: day.revenue.amount(),
            bills: day.bills,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopItemResponse {
    pub id: String,
    pub name: String,
    pub quantity: u64,
    pub bills: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

impl From<TopItem> for TopItemResponse {
    fn from(item: TopItem) -> Self {
        TopItemResponse {
            id: item.id,
            name: item.name,
            quantity: item.quantity,
            bills: item.bills,
            revenue: item.revenue.amount(),
        }
    }
}
