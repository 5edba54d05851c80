//! Medicine aggregate

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{MedicineId, Money, SequentialCode};

use crate::error::InventoryError;
use crate::status::MedicineStatus;
use crate::stock::{StockOperation, MAX_STOCK};

/// Minimum stock level applied when none is given
pub const DEFAULT_MIN_STOCK_LEVEL: u32 = 10;

/// Caller-supplied medicine fields
#[derive(Debug, Clone)]
pub struct MedicineDetails {
    pub name: String,
    pub generic_name: Option<String>,
    pub category: String,
    pub manufacturer: Option<String>,
    pub batch_number: Option<String>,
    pub description: Option<String>,
    pub buying_price: Money,
    pub selling_price: Money,
    pub stock: u32,
    pub min_stock_level: Option<u32>,
    pub expiry_date: NaiveDate,
}

/// Editable medicine fields; stock, status and code are never set this way
#[derive(Debug, Clone, Default)]
pub struct MedicineUpdate {
    pub name: Option<String>,
    pub generic_name: Option<String>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub batch_number: Option<String>,
    pub description: Option<String>,
    pub buying_price: Option<Money>,
    pub selling_price: Option<Money>,
    pub min_stock_level: Option<u32>,
    pub expiry_date: Option<NaiveDate>,
}

/// A medicine on the clinic's shelf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: MedicineId,
    /// Sequential `MED` code, assigned once
    pub code: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub category: String,
    pub manufacturer: Option<String>,
    pub batch_number: Option<String>,
    pub description: Option<String>,
    pub buying_price: Money,
    pub selling_price: Money,
    pub stock: u32,
    pub min_stock_level: u32,
    pub expiry_date: NaiveDate,
    pub status: MedicineStatus,
    /// Bumped by the store on every successful write
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    /// Builds a validated medicine under `code` with its status derived for `today`
    pub fn new(
        code: SequentialCode,
        details: MedicineDetails,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Self, InventoryError> {
        validate_text("name", &details.name)?;
        validate_text("category", &details.category)?;
        validate_prices(&details.buying_price, &details.selling_price)?;
        validate_count("stock", details.stock)?;

        let min_stock_level = details.min_stock_level.unwrap_or(DEFAULT_MIN_STOCK_LEVEL);
        validate_count("minimum stock level", min_stock_level)?;
        Ok(Self {
            id: MedicineId::new_v7(),
            code: code.to_string(),
            name: details.name.trim().to_string(),
            generic_name: details.generic_name,
            category: details.category.trim().to_string(),
            manufacturer: details.manufacturer,
            batch_number: details.batch_number,
            description: details.description,
            buying_price: details.buying_price,
            selling_price: details.selling_price,
            stock: details.stock,
            min_stock_level,
            expiry_date: details.expiry_date,
            status: MedicineStatus::derive(details.stock, details.expiry_date, min_stock_level, today),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies an edit and re-derives the status; nothing changes on error
    pub fn apply_update(
        &mut self,
        update: MedicineUpdate,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(), InventoryError> {
        if let Some(name) = &update.name {
            validate_text("name", name)?;
        }
        if let Some(category) = &update.category {
            validate_text("category", category)?;
        }
        let buying = update.buying_price.unwrap_or(self.buying_price);
        let selling = update.selling_price.unwrap_or(self.selling_price);
        validate_prices(&buying, &selling)?;
        if let Some(min) = update.min_stock_level {
            validate_count("minimum stock level", min)?;
        }

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if update.generic_name.is_some() {
            self.generic_name = update.generic_name;
        }
        if let Some(category) = update.category {
            self.category = category.trim().to_string();
        }
        if update.manufacturer.is_some() {
            self.manufacturer = update.manufacturer;
        }
        if update.batch_number.is_some() {
            self.batch_number = update.batch_number;
        }
        if update.description.is_some() {
            self.description = update.description;
        }
        self.buying_price = buying;
        self.selling_price = selling;
        if let Some(min) = update.min_stock_level {
            self.min_stock_level = min;
        }
        if let Some(expiry) = update.expiry_date {
            self.expiry_date = expiry;
        }
        self.refresh_status(today);
        self.updated_at = now;
        Ok(())
    }

    /// Re-derives `status` from the current stock, expiry and minimum level
    pub fn refresh_status(&mut self, today: NaiveDate) {
        self.status = MedicineStatus::derive(self.stock, self.expiry_date, self.min_stock_level, today);
    }

    /// Takes `quantity` units off the shelf
    ///
    /// Fails without touching the stock when fewer than `quantity` units remain.
    pub fn withdraw(&mut self, quantity: u32, today: NaiveDate) -> Result<(), InventoryError> {
        if quantity > self.stock {
            return Err(InventoryError::InsufficientStock {
                medicine: self.name.clone(),
                available: self.stock,
                requested: quantity,
            });
        }
        self.stock -= quantity;
        self.refresh_status(today);
        Ok(())
    }

    /// Puts `quantity` units back on the shelf
    ///
    /// Fails without touching the stock when the shelf would exceed [`MAX_STOCK`].
    pub fn restock(&mut self, quantity: u32, today: NaiveDate) -> Result<(), InventoryError> {
        self.adjust_stock(quantity, StockOperation::Add, today)
    }

    /// Applies a manual adjustment; subtracting past zero leaves zero
    ///
    /// Fails without touching the stock when the result would exceed [`MAX_STOCK`].
    pub fn adjust_stock(
        &mut self,
        quantity: u32,
        operation: StockOperation,
        today: NaiveDate,
    ) -> Result<(), InventoryError> {
        self.stock = operation.apply(self.stock, quantity).ok_or_else(|| {
            InventoryError::validation(format!(
                "{operation} {quantity} would take {} past {MAX_STOCK} units",
                self.name
            ))
        })?;
        self.refresh_status(today);
        Ok(())
    }

    /// Selling price minus buying price
    pub fn profit_per_unit(&self) -> Money {
        Money::new(
            self.selling_price.amount() - self.buying_price.amount(),
            self.selling_price.currency(),
        )
    }

    /// Profit as a percentage of the buying price, to 2 dp
    ///
    /// Zero for free stock, or when the margin is too large to represent.
    pub fn profit_margin(&self) -> Decimal {
        let buying = self.buying_price.amount();
        if buying.is_zero() {
            return Decimal::ZERO;
        }
        self.selling_price
            .amount()
            .checked_sub(buying)
            .and_then(|profit| profit.checked_div(buying))
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .map_or(Decimal::ZERO, |margin| margin.round_dp(2))
    }

    /// Case-insensitive match on name, generic name or `MED` code
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self
                .generic_name
                .as_deref()
                .is_some_and(|g| g.to_lowercase().contains(&needle))
            || self.code.to_lowercase().contains(&needle)
    }
}

fn validate_text(field: &str, value: &str) -> Result<(), InventoryError> {
    if value.trim().is_empty() {
        return Err(InventoryError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn validate_count(field: &str, value: u32) -> Result<(), InventoryError> {
    if value > MAX_STOCK {
        return Err(InventoryError::validation(format!("{field} must be at most {MAX_STOCK}")));
    }
    Ok(())
}

fn validate_prices(buying: &Money, selling: &Money) -> Result<(), InventoryError> {
    if buying.is_negative() || selling.is_negative() {
        return Err(InventoryError::validation("prices must not be negative"));
    }
    for price in [buying, selling] {
        price
            .within_limit()
            .map_err(|e| InventoryError::validation(format!("price {e}")))?;
    }
    if buying.currency() != selling.currency() {
        return Err(InventoryError::validation(format!(
            "buying price is in {} but selling price is in {}",
            buying.currency(),
            selling.currency()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use core_kernel::{Currency, SequenceKind};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn inr(amount: Decimal) -> Money {
        Money::new(amount, Currency::INR)
    }

    fn medicine(stock: u32) -> Medicine {
        let details = MedicineDetails {
            name: "Paracetamol 500mg".to_string(),
            generic_name: Some("Acetaminophen".to_string()),
            category: "Analgesic".to_string(),
            manufacturer: None,
            batch_number: None,
            description: None,
            buying_price: inr(dec!(40)),
            selling_price: inr(dec!(50)),
            stock,
            min_stock_level: None,
            expiry_date: today() + Duration::days(365),
        };
        Medicine::new(SequentialCode::first(SequenceKind::Medicine), details, today(), Utc::now()).unwrap()
    }

    #[test]
    fn test_new_medicine_defaults() {
        let m = medicine(100);
        assert_eq!(m.code, "MED001");
        assert_eq!(m.min_stock_level, DEFAULT_MIN_STOCK_LEVEL);
        assert_eq!(m.status, MedicineStatus::InStock);
        assert_eq!(m.version, 0);
    }

    #[test]
    fn test_profit_figures() {
        let m = medicine(100);
        assert_eq!(m.profit_per_unit().amount(), dec!(10));
        assert_eq!(m.profit_margin(), dec!(25));
    }

    #[test]
    fn test_profit_margin_with_free_stock_is_zero() {
        let mut m = medicine(100);
        m.buying_price = inr(dec!(0));
        assert_eq!(m.profit_margin(), Decimal::ZERO);
    }

    #[test]
    fn test_profit_margin_rounds_to_two_places() {
        let mut m = medicine(100);
        m.buying_price = inr(dec!(30));
        m.selling_price = inr(dec!(40));
        assert_eq!(m.profit_margin(), dec!(33.33));
    }

    #[test]
    fn test_profit_margin_of_tiny_buying_price_does_not_panic() {
        let mut m = medicine(100);
        m.buying_price = inr(dec!(0.0001));
        m.selling_price = inr(dec!(79228162514264337593543950335));
        assert_eq!(m.profit_margin(), Decimal::ZERO);
    }

    #[test]
    fn test_price_beyond_storable_range_is_rejected() {
        let mut m = medicine(100);
        let update = MedicineUpdate {
            selling_price: Some(inr(core_kernel::MAX_AMOUNT + dec!(1))),
            ..Default::default()
        };
        assert!(matches!(
            m.apply_update(update, today(), Utc::now()),
            Err(InventoryError::Validation(_))
        ));
    }

    #[test]
    fn test_withdraw_exact_stock_leaves_out_of_stock() {
        let mut m = medicine(10);
        m.withdraw(10, today()).unwrap();
        assert_eq!(m.stock, 0);
        assert_eq!(m.status, MedicineStatus::OutOfStock);
    }

    #[test]
    fn test_withdraw_beyond_stock_changes_nothing() {
        let mut m = medicine(10);
        let err = m.withdraw(11, today()).unwrap_err();
        match err {
            InventoryError::InsufficientStock { medicine, available, requested } => {
                assert_eq!(medicine, "Paracetamol 500mg");
                assert_eq!(available, 10);
                assert_eq!(requested, 11);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(m.stock, 10);
    }

    #[test]
    fn test_restock_recomputes_status() {
        let mut m = medicine(0);
        assert_eq!(m.status, MedicineStatus::OutOfStock);
        m.restock(5, today()).unwrap();
        assert_eq!(m.status, MedicineStatus::LowStock);
    }

    #[test]
    fn test_restock_past_max_stock_changes_nothing() {
        let mut m = medicine(MAX_STOCK - 2);
        let err = m.restock(3, today()).unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert_eq!(m.stock, MAX_STOCK - 2);

        m.restock(2, today()).unwrap();
        assert_eq!(m.stock, MAX_STOCK);
    }

    #[test]
    fn test_new_medicine_rejects_unstorable_stock() {
        let details = MedicineDetails {
            name: "Saline".to_string(),
            generic_name: None,
            category: "Fluids".to_string(),
            manufacturer: None,
            batch_number: None,
            description: None,
            buying_price: inr(dec!(10)),
            selling_price: inr(dec!(20)),
            stock: MAX_STOCK + 1,
            min_stock_level: None,
            expiry_date: today() + Duration::days(365),
        };
        let result = Medicine::new(SequentialCode::first(SequenceKind::Medicine), details, today(), Utc::now());
        assert!(matches!(result, Err(InventoryError::Validation(_))));
    }

    #[test]
    fn test_update_rejects_negative_price() {
        let mut m = medicine(50);
        let before = m.clone();
        let update = MedicineUpdate {
            name: Some("Renamed".to_string()),
            selling_price: Some(inr(dec!(-1))),
            ..Default::default()
        };
        assert!(m.apply_update(update, today(), Utc::now()).is_err());
        assert_eq!(m, before);
    }

    #[test]
    fn test_update_rejects_mixed_currencies() {
        let mut m = medicine(50);
        let update = MedicineUpdate {
            selling_price: Some(Money::new(dec!(5), Currency::USD)),
            ..Default::default()
        };
        assert!(m.apply_update(update, today(), Utc::now()).is_err());
    }

    #[test]
    fn test_update_expiry_rederives_status() {
        let mut m = medicine(50);
        let update = MedicineUpdate {
            expiry_date: Some(today() + Duration::days(5)),
            ..Default::default()
        };
        m.apply_update(update, today(), Utc::now()).unwrap();
        assert_eq!(m.status, MedicineStatus::ExpiringSoon);
    }
}
