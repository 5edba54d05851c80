//! Medicine stock and status tests

use chrono::{Duration, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, SequenceKind, SequentialCode};
use domain_inventory::{
    group_alerts, Medicine, MedicineDetails, MedicineQuery, MedicineStatus, StockOperation,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn medicine(number: u64, name: &str, stock: u32, min: u32, expires_in_days: i64) -> Medicine {
    let details = MedicineDetails {
        name: name.to_string(),
        generic_name: None,
        category: "Antibiotic".to_string(),
        manufacturer: Some("Cipla".to_string()),
        batch_number: Some("B-204".to_string()),
        description: None,
        buying_price: Money::new(dec!(8), Currency::INR),
        selling_price: Money::new(dec!(12), Currency::INR),
        stock,
        min_stock_level: Some(min),
        expiry_date: today() + Duration::days(expires_in_days),
    };
    Medicine::new(SequentialCode::new(SequenceKind::Medicine, number), details, today(), Utc::now()).unwrap()
}

#[test]
fn test_status_scenarios() {
    assert_eq!(medicine(1, "A", 10, 10, 60).status, MedicineStatus::LowStock);
    assert_eq!(medicine(2, "B", 5, 10, 10).status, MedicineStatus::ExpiringSoon);
    assert_eq!(medicine(3, "C", 0, 10, 10).status, MedicineStatus::OutOfStock);
    assert_eq!(medicine(4, "D", 11, 10, 31).status, MedicineStatus::InStock);
}

#[test]
fn test_status_serializes_kebab_case() {
    let json = serde_json::to_string(&MedicineStatus::ExpiringSoon).unwrap();
    assert_eq!(json, "\"expiring-soon\"");
    let op: StockOperation = serde_json::from_str("\"subtract\"").unwrap();
    assert_eq!(op, StockOperation::Subtract);
}

#[test]
fn test_query_filters() {
    let amoxicillin = medicine(1, "Amoxicillin", 100, 10, 200);
    let azithro = medicine(2, "Azithromycin", 0, 10, 200);

    let query = MedicineQuery {
        search: Some("amox".to_string()),
        ..Default::default()
    };
    assert!(query.matches(&amoxicillin));
    assert!(!query.matches(&azithro));

    let out = MedicineQuery::by_status(MedicineStatus::OutOfStock);
    assert!(out.matches(&azithro));
    assert!(!out.matches(&amoxicillin));

    let category = MedicineQuery {
        category: Some("antibiotic".to_string()),
        ..Default::default()
    };
    assert!(category.matches(&amoxicillin));
}

#[test]
fn test_alerts_rederive_stale_status() {
    let stale = medicine(1, "Cetirizine", 50, 10, 40);
    assert_eq!(stale.status, MedicineStatus::InStock);
    // twenty days on, nothing has rewritten the stored status
    let later = today() + Duration::days(20);

    let alerts = group_alerts(
        vec![stale, medicine(2, "Ibuprofen", 3, 10, 400), medicine(3, "ORS", 0, 10, 400)],
        later,
    );
    assert_eq!(alerts.expiring_soon.len(), 1);
    assert_eq!(alerts.low_stock.len(), 1);
    assert_eq!(alerts.out_of_stock.len(), 1);
    assert!(!alerts.is_empty());
}

#[test]
fn test_alerts_for_healthy_shelf_are_empty() {
    let alerts = group_alerts(vec![medicine(1, "Vitamin C", 500, 10, 400)], today());
    assert!(alerts.is_empty());
}

fn operation() -> impl Strategy<Value = (u32, StockOperation)> {
    (
        0u32..200,
        prop_oneof![
            Just(StockOperation::Set),
            Just(StockOperation::Add),
            Just(StockOperation::Subtract),
        ],
    )
}

proptest! {
    #[test]
    fn prop_status_tracks_every_mutation(
        initial in 0u32..100,
        ops in prop::collection::vec(operation(), 1..30),
        withdrawals in prop::collection::vec(1u32..40, 0..10),
    ) {
        let mut m = medicine(1, "Prop", initial, 10, 20);
        for (quantity, op) in ops {
            m.adjust_stock(quantity, op, today()).unwrap();
            prop_assert_eq!(m.status, MedicineStatus::derive(m.stock, m.expiry_date, m.min_stock_level, today()));
        }
        for quantity in withdrawals {
            let before = m.stock;
            match m.withdraw(quantity, today()) {
                Ok(()) => prop_assert_eq!(m.stock, before - quantity),
                Err(_) => prop_assert_eq!(m.stock, before),
            }
            prop_assert_eq!(m.status, MedicineStatus::derive(m.stock, m.expiry_date, m.min_stock_level, today()));
        }
    }

    #[test]
    fn prop_withdraw_then_restock_is_identity(stock in 0u32..500, quantity in 0u32..500) {
        let mut m = medicine(1, "Prop", stock, 10, 200);
        let original = m.stock;
        if m.withdraw(quantity, today()).is_ok() {
            m.restock(quantity, today()).unwrap();
        }
        prop_assert_eq!(m.stock, original);
    }
}
