//! Property-Based Test Generators
//!
//! Proptest strategies for amounts, shelf states and bill lines that respect
//! the domain's input rules.

use chrono::{Duration, NaiveDate};
use core_kernel::{Currency, Money};
use domain_inventory::StockOperation;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::INR),
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::JPY),
    ]
}

/// Prices from 0.01 to 10,000.00 with two decimal places
pub fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Non-negative INR amounts
pub fn inr_money_strategy() -> impl Strategy<Value = Money> {
    price_strategy().prop_map(|amount| Money::new(amount, Currency::INR))
}

/// Fees including zero
pub fn fee_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![Just(Decimal::ZERO), price_strategy()]
}

/// Quantities a bill line may ask for
pub fn quantity_strategy() -> impl Strategy<Value = u32> {
    1u32..50u32
}

/// Shelf counts including empty
pub fn stock_strategy() -> impl Strategy<Value = u32> {
    0u32..500u32
}

pub fn stock_operation_strategy() -> impl Strategy<Value = StockOperation> {
    prop_oneof![
        Just(StockOperation::Set),
        Just(StockOperation::Add),
        Just(StockOperation::Subtract),
    ]
}

/// A sequence of stock adjustments
pub fn adjustments_strategy() -> impl Strategy<Value = Vec<(StockOperation, u32)>> {
    proptest::collection::vec((stock_operation_strategy(), 0u32..200u32), 0..20)
}

/// Expiry dates from a year ago to two years ahead of `today`
pub fn expiry_strategy(today: NaiveDate) -> impl Strategy<Value = NaiveDate> {
    (-365i64..730i64).prop_map(move |offset| today + Duration::days(offset))
}

/// `(price, quantity)` medicine lines
pub fn medicine_lines_strategy() -> impl Strategy<Value = Vec<(Decimal, u32)>> {
    proptest::collection::vec((price_strategy(), quantity_strategy()), 0..8)
}

/// Service prices on one bill
pub fn service_prices_strategy() -> impl Strategy<Value = Vec<Decimal>> {
    proptest::collection::vec(price_strategy(), 0..5)
}
