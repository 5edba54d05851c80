//! Medicine status derivation

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Medicines expiring within this many days are flagged
pub const EXPIRY_WARNING_DAYS: i64 = 30;

/// Shelf status of a medicine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MedicineStatus {
    InStock,
    LowStock,
    ExpiringSoon,
    OutOfStock,
}

impl MedicineStatus {
    /// Derives the status; the first matching rule wins
    ///
    /// 1. no stock left is `OutOfStock`
    /// 2. expiry on or before `today + 30 days` is `ExpiringSoon`
    /// 3. stock at or below the minimum level is `LowStock`
    /// 4. anything else is `InStock`
    pub fn derive(stock: u32, expiry_date: NaiveDate, min_stock_level: u32, today: NaiveDate) -> Self {
        if stock == 0 {
            MedicineStatus::OutOfStock
        } else if expiry_date <= today + Duration::days(EXPIRY_WARNING_DAYS) {
            MedicineStatus::ExpiringSoon
        } else if stock <= min_stock_level {
            MedicineStatus::LowStock
        } else {
            MedicineStatus::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MedicineStatus::InStock => "in-stock",
            MedicineStatus::LowStock => "low-stock",
            MedicineStatus::ExpiringSoon => "expiring-soon",
            MedicineStatus::OutOfStock => "out-of-stock",
        }
    }

    /// Parses the kebab-case wire name
    pub fn parse(value: &str) -> Option<Self> {
        [
            MedicineStatus::InStock,
            MedicineStatus::LowStock,
            MedicineStatus::ExpiringSoon,
            MedicineStatus::OutOfStock,
        ]
        .into_iter()
        .find(|status| status.as_str() == value)
    }
}

impl fmt::Display for MedicineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_stock_at_minimum_is_low() {
        let expiry = today() + Duration::days(60);
        assert_eq!(MedicineStatus::derive(10, expiry, 10, today()), MedicineStatus::LowStock);
    }

    #[test]
    fn test_expiry_beats_low_stock() {
        let expiry = today() + Duration::days(10);
        assert_eq!(MedicineStatus::derive(5, expiry, 10, today()), MedicineStatus::ExpiringSoon);
    }

    #[test]
    fn test_out_of_stock_beats_everything() {
        let expired = today() - Duration::days(1);
        assert_eq!(MedicineStatus::derive(0, expired, 10, today()), MedicineStatus::OutOfStock);
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let boundary = today() + Duration::days(EXPIRY_WARNING_DAYS);
        assert_eq!(MedicineStatus::derive(100, boundary, 10, today()), MedicineStatus::ExpiringSoon);
        let after = boundary + Duration::days(1);
        assert_eq!(MedicineStatus::derive(100, after, 10, today()), MedicineStatus::InStock);
    }

    #[test]
    fn test_wire_names() {
        for status in [
            MedicineStatus::InStock,
            MedicineStatus::LowStock,
            MedicineStatus::ExpiringSoon,
            MedicineStatus::OutOfStock,
        ] {
            assert_eq!(MedicineStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(MedicineStatus::parse("in_stock"), None);
    }
}
