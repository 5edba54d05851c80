//! Custom Test Assertions
//!
//! Assertion helpers for ledger invariants with messages that name the
//! offending record.

use std::collections::HashSet;

use chrono::NaiveDate;
use core_kernel::{Money, SequentialCode};
use domain_billing::Bill;
use domain_inventory::{Medicine, MedicineStatus};
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts a money amount exactly, ignoring trailing zeros
pub fn assert_amount(money: &Money, expected: Decimal) {
    assert_eq!(
        money.amount().normalize(),
        expected.normalize(),
        "expected {} {}, got {}",
        money.currency().code(),
        expected,
        money.amount()
    );
}

/// Asserts that a bill's stored totals match its fee and lines
pub fn assert_bill_totals_consistent(bill: &Bill) {
    let medicines: Decimal = bill.medicines.iter().map(|line| line.total.amount()).sum();
    let services: Decimal = bill.services.iter().map(|line| line.price.amount()).sum();
    for line in &bill.medicines {
        assert_eq!(
            line.total.amount(),
            line.price.amount() * Decimal::from(line.quantity),
            "{}: line total for {} is not price x quantity",
            bill.code,
            line.name
        );
    }
    assert_eq!(bill.medicines_total.amount(), medicines, "{}: medicinesTotal", bill.code);
    assert_eq!(bill.services_total.amount(), services, "{}: servicesTotal", bill.code);
    assert_eq!(
        bill.total_amount.amount(),
        bill.consultation_fee.amount() + medicines + services,
        "{}: totalAmount",
        bill.code
    );
}

/// Asserts that a medicine's stored status is the one its shelf state implies
pub fn assert_status_consistent(medicine: &Medicine, today: NaiveDate) {
    let expected = MedicineStatus::derive(medicine.stock, medicine.expiry_date, medicine.min_stock_level, today);
    assert_eq!(
        medicine.status, expected,
        "{} ({}): stock={}, min={}, expiry={}",
        medicine.code, medicine.name, medicine.stock, medicine.min_stock_level, medicine.expiry_date
    );
}

/// Asserts that no code was issued twice
pub fn assert_codes_distinct(codes: &[SequentialCode]) {
    let unique: HashSet<String> = codes.iter().map(|code| code.to_string()).collect();
    assert_eq!(unique.len(), codes.len(), "duplicate codes issued: {codes:?}");
}
