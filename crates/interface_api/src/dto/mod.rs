//! Request and response bodies
//!
//! Amounts go over the wire as JSON numbers; each money-bearing response
//! also names its `currency`.

pub mod patients;
pub mod medicines;
pub mod services;
pub mod bills;
pub mod dashboard;
pub mod auth;

use core_kernel::{Currency, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page a client may ask for
pub const MAX_PAGE_SIZE: u32 = 100;

/// A request price as money, rejecting negatives and amounts too large to store
pub fn price(field: &str, amount: Decimal, currency: Currency) -> Result<Money, ApiError> {
    Money::non_negative(amount, currency).map_err(|e| ApiError::Validation(format!("{field}: {e}")))
}

/// Reads a field that may be absent, `null` or a value
///
/// With `#[serde(default)]` an absent field stays `None` and an explicit
/// `null` becomes `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// One page of a list endpoint
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Resolved `page`/`limit` query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    /// Pages are 1-based; the limit is clamped to `1..=MAX_PAGE_SIZE`
    pub fn from_params(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn wrap<T>(&self, data: Vec<T>, total: u64) -> Paginated<T> {
        Paginated {
            data,
            total,
            page: self.page,
            limit: self.limit,
        }
    }
}
