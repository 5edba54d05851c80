use chrono::Utc;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, SequenceKind, SequentialCode};
use domain_catalog::{ServiceDetails, ServiceItem, ServiceQuery, ServiceUpdate};

fn service(number: u64, name: &str, category: &str) -> ServiceItem {
    let details = ServiceDetails {
        name: name.to_string(),
        description: None,
        category: category.to_string(),
        price: Money::new(dec!(300), Currency::INR),
        duration: Some("15 mins".to_string()),
    };
    ServiceItem::new(SequentialCode::new(SequenceKind::Service, number), details, Utc::now()).unwrap()
}

#[test]
fn test_new_service_is_active() {
    let s = service(1, "Dressing", "Procedure");
    assert_eq!(s.code, "SER001");
    assert!(s.is_active);
}

#[test]
fn test_negative_price_rejected() {
    let details = ServiceDetails {
        name: "ECG".to_string(),
        description: None,
        category: "Diagnostics".to_string(),
        price: Money::new(dec!(-10), Currency::INR),
        duration: None,
    };
    let result = ServiceItem::new(SequentialCode::first(SequenceKind::Service), details, Utc::now());
    assert!(result.is_err());
}

#[test]
fn test_price_beyond_storable_range_rejected() {
    let details = ServiceDetails {
        name: "Surgery".to_string(),
        description: None,
        category: "Procedure".to_string(),
        price: Money::new(dec!(1000000000000000), Currency::INR),
        duration: None,
    };
    let result = ServiceItem::new(SequentialCode::first(SequenceKind::Service), details, Utc::now());
    assert!(matches!(result, Err(domain_catalog::CatalogError::Validation(_))));

    let mut s = service(1, "Dressing", "Procedure");
    let update = ServiceUpdate {
        price: Some(Money::new(dec!(50000000000000000000000000000), Currency::INR)),
        ..Default::default()
    };
    assert!(s.apply_update(update, Utc::now()).is_err());
    assert_eq!(s.price.amount(), dec!(300));
}

#[test]
fn test_deactivated_services_hidden_by_default() {
    let mut s = service(1, "Nebulization", "Procedure");
    s.deactivate(Utc::now());

    assert!(!ServiceQuery::active().matches(&s));
    let all = ServiceQuery {
        include_inactive: true,
        ..Default::default()
    };
    assert!(all.matches(&s));
}

#[test]
fn test_query_category_and_search() {
    let s = service(7, "Blood Sugar Test", "Lab");
    let lab = ServiceQuery {
        category: Some("lab".to_string()),
        ..Default::default()
    };
    assert!(lab.matches(&s));

    let search = ServiceQuery {
        search: Some("ser007".to_string()),
        ..Default::default()
    };
    assert!(search.matches(&s));
}

#[test]
fn test_update_can_reactivate() {
    let mut s = service(1, "X-Ray", "Imaging");
    s.deactivate(Utc::now());
    let update = ServiceUpdate {
        is_active: Some(true),
        price: Some(Money::new(dec!(450), Currency::INR)),
        ..Default::default()
    };
    s.apply_update(update, Utc::now()).unwrap();
    assert!(s.is_active);
    assert_eq!(s.price.amount(), dec!(450));
}
