//! Service Catalog Domain
//!
//! The billable services a clinic offers (dressings, lab tests, procedures),
//! each under a sequential `SER` code. Services are never removed; deleting
//! one marks it inactive so past bills keep a resolvable reference.

pub mod service;
pub mod error;
pub mod ports;
pub mod services;

pub use service::{ServiceDetails, ServiceItem, ServiceUpdate};
pub use error::CatalogError;
pub use ports::{CatalogPort, ServiceQuery};
pub use services::CatalogService;
