//! Money types with precise decimal arithmetic
//!
//! This module provides a type-safe representation of monetary values
//! using rust_decimal for precise calculations without floating-point errors.
//! Clinic prices, fees and bill totals are all carried as [`Money`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Largest amount a price, fee or bill total may carry
///
/// Amounts are persisted as NUMERIC(19,4), which leaves 15 integer digits.
pub const MAX_AMOUNT: Decimal = dec!(999999999999999.9999);

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    INR,
    USD,
    EUR,
    GBP,
    JPY,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::INR => "₹",
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::INR => "INR",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::INR
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INR" => Ok(Currency::INR),
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "JPY" => Ok(Currency::JPY),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Amount out of range: {0}")]
    Overflow(String),
}

/// A monetary amount with associated currency
///
/// Amounts are stored with 4 decimal places internally and rounded to the
/// currency's minor unit only for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Creates a non-negative Money value no larger than [`MAX_AMOUNT`]
    pub fn non_negative(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::InvalidAmount(format!(
                "amount must not be negative, got {}",
                amount
            )));
        }
        Self::new(amount, currency).within_limit()
    }

    /// Creates Money from an integer amount in minor units (e.g., paise)
    pub fn from_minor(minor_units: i64, currency: Currency) -> Self {
        let divisor = Decimal::new(10_i64.pow(currency.decimal_places()), 0);
        Self::new(Decimal::new(minor_units, 0) / divisor, currency)
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is positive
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Returns self when its magnitude is at most [`MAX_AMOUNT`]
    pub fn within_limit(self) -> Result<Self, MoneyError> {
        if self.amount.abs() > MAX_AMOUNT {
            return Err(MoneyError::Overflow(format!(
                "{} exceeds the largest storable amount {}",
                self.amount, MAX_AMOUNT
            )));
        }
        Ok(self)
    }

    /// Rounds to the currency's standard decimal places
    pub fn round_to_currency(&self) -> Self {
        Self {
            amount: self.amount.round_dp(self.currency.decimal_places()),
            currency: self.currency,
        }
    }

    /// Checked addition that returns an error on currency mismatch or overflow
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| MoneyError::Overflow(format!("{} + {}", self.amount, other.amount)))?;
        Ok(Self::new(amount, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch or overflow
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| MoneyError::Overflow(format!("{} - {}", self.amount, other.amount)))?;
        Ok(Self::new(amount, self.currency))
    }

    /// Multiplies by a scalar
    pub fn checked_mul(&self, factor: Decimal) -> Result<Money, MoneyError> {
        let amount = self
            .amount
            .checked_mul(factor)
            .ok_or_else(|| MoneyError::Overflow(format!("{} * {}", self.amount, factor)))?;
        Ok(Self::new(amount, self.currency))
    }

    /// Multiplies a unit price by a whole quantity
    pub fn times(&self, quantity: u32) -> Result<Money, MoneyError> {
        self.checked_mul(Decimal::from(quantity))
    }

    fn same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(())
    }

    /// Sums a sequence of amounts, starting from zero in `currency`
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyMismatch` if any item is in another currency
    pub fn sum<'a, I>(items: I, currency: Currency) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        items
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.checked_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{} {:.dp$}",
            self.currency.symbol(),
            self.amount,
            dp = dp as usize
        )
    }
}

/// Whole-number share of `part` in `whole`, rounded down
///
/// Returns zero when `whole` is zero, so a set of shares computed against the
/// same whole never sums above 100.
pub fn percentage_floor(part: Decimal, whole: Decimal) -> u32 {
    if whole.is_zero() {
        return 0;
    }
    part.checked_mul(dec!(100))
        .and_then(|scaled| scaled.checked_div(whole))
        .and_then(|share| share.floor().to_u32())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let m = Money::new(dec!(100.50), Currency::INR);
        assert_eq!(m.amount(), dec!(100.50));
        assert_eq!(m.currency(), Currency::INR);
    }

    #[test]
    fn test_money_from_minor() {
        let m = Money::from_minor(10050, Currency::INR);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_non_negative_rejects_negative() {
        assert!(Money::non_negative(dec!(-0.01), Currency::INR).is_err());
        assert!(Money::non_negative(dec!(0), Currency::INR).is_ok());
    }

    #[test]
    fn test_currency_mismatch() {
        let inr = Money::new(dec!(100.00), Currency::INR);
        let eur = Money::new(dec!(100.00), Currency::EUR);

        let result = inr.checked_add(&eur);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_times_quantity() {
        let unit = Money::new(dec!(12.50), Currency::INR);
        assert_eq!(unit.times(4).unwrap().amount(), dec!(50.00));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let huge = Money::new(dec!(50000000000000000000000000000), Currency::INR);
        assert!(matches!(huge.times(2), Err(MoneyError::Overflow(_))));
        assert!(matches!(huge.checked_add(&huge), Err(MoneyError::Overflow(_))));
        assert!(matches!(huge.within_limit(), Err(MoneyError::Overflow(_))));
    }

    #[test]
    fn test_non_negative_caps_at_max_amount() {
        assert!(Money::non_negative(MAX_AMOUNT, Currency::INR).is_ok());
        let err = Money::non_negative(MAX_AMOUNT + dec!(1), Currency::INR).unwrap_err();
        assert!(matches!(err, MoneyError::Overflow(_)));
    }

    #[test]
    fn test_sum_empty_is_zero() {
        let total = Money::sum(std::iter::empty::<&Money>(), Currency::INR).unwrap();
        assert!(total.is_zero());
    }

    #[test]
    fn test_percentage_floor() {
        assert_eq!(percentage_floor(dec!(1), dec!(3)), 33);
        assert_eq!(percentage_floor(dec!(2), dec!(3)), 66);
        assert_eq!(percentage_floor(dec!(5), dec!(0)), 0);
        assert_eq!(percentage_floor(dec!(900), dec!(900)), 100);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn money_sum_is_order_independent(
            amounts in proptest::collection::vec(0i64..10_000_000i64, 0..20)
        ) {
            let items: Vec<Money> = amounts.iter().map(|a| Money::from_minor(*a, Currency::INR)).collect();
            let forward = Money::sum(items.iter(), Currency::INR).unwrap();
            let backward = Money::sum(items.iter().rev(), Currency::INR).unwrap();
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn floor_percentages_never_exceed_hundred(
            a in 0i64..1_000_000i64,
            b in 0i64..1_000_000i64,
            c in 0i64..1_000_000i64
        ) {
            let whole = Decimal::from(a + b + c);
            let total = percentage_floor(Decimal::from(a), whole)
                + percentage_floor(Decimal::from(b), whole)
                + percentage_floor(Decimal::from(c), whole);
            prop_assert!(total <= 100);
        }
    }
}
