//! Tests for bill totals, payment state and bill queries

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{BillId, Currency, MedicineId, Money, PatientId, PortError, ServiceId};
use domain_billing::{
    compute_totals, Bill, BillQuery, LedgerError, MedicineLine, PaymentMethod, PaymentStatus, ServiceLine,
};
use domain_inventory::InventoryError;

fn inr(amount: Decimal) -> Money {
    Money::new(amount, Currency::INR)
}

fn bill(code: &str, patient_name: &str, days_ago: i64) -> Bill {
    let created = Utc::now() - Duration::days(days_ago);
    let mut bill = Bill {
        id: BillId::new_v7(),
        code: code.to_string(),
        patient: PatientId::new(),
        patient_name: patient_name.to_string(),
        patient_phone: "9000000001".to_string(),
        consultation_fee: inr(dec!(500)),
        medicines: vec![MedicineLine::new(MedicineId::new(), "Paracetamol", inr(dec!(50)), 2).unwrap()],
        services: vec![ServiceLine {
            service: ServiceId::new(),
            name: "Dressing".to_string(),
            price: inr(dec!(300)),
        }],
        medicines_total: inr(dec!(0)),
        services_total: inr(dec!(0)),
        total_amount: inr(dec!(0)),
        payment_status: PaymentStatus::default(),
        payment_method: None,
        notes: None,
        created_at: created,
        updated_at: created,
    };
    bill.refresh_totals().unwrap();
    bill
}

// ============================================================================
// Totals
// ============================================================================

mod totals_tests {
    use super::*;

    #[test]
    fn test_refresh_totals_standard_bill() {
        let b = bill("BILL001", "Kavya", 0);
        assert_eq!(b.medicines_total.amount(), dec!(100));
        assert_eq!(b.services_total.amount(), dec!(300));
        assert_eq!(b.total_amount.amount(), dec!(900));
    }

    #[test]
    fn test_quantity_of_sums_repeated_lines() {
        let mut b = bill("BILL001", "Kavya", 0);
        let id = b.medicines[0].medicine;
        b.medicines.push(MedicineLine::new(id, "Paracetamol", inr(dec!(50)), 3).unwrap());
        assert_eq!(b.quantity_of(id), 5);
        assert_eq!(b.quantity_of(MedicineId::new()), 0);
    }

    fn medicine_line() -> impl Strategy<Value = MedicineLine> {
        (0i64..100_000, 1u32..50).prop_map(|(paise, quantity)| {
            MedicineLine::new(MedicineId::new(), "Line", Money::from_minor(paise, Currency::INR), quantity).unwrap()
        })
    }

    fn service_line() -> impl Strategy<Value = ServiceLine> {
        (0i64..500_000).prop_map(|paise| ServiceLine {
            service: ServiceId::new(),
            name: "Service".to_string(),
            price: Money::from_minor(paise, Currency::INR),
        })
    }

    proptest! {
        #[test]
        fn prop_total_is_fee_plus_lines(
            fee in 0i64..1_000_000,
            medicines in prop::collection::vec(medicine_line(), 0..10),
            services in prop::collection::vec(service_line(), 0..10),
        ) {
            let fee = Money::from_minor(fee, Currency::INR);
            let totals = compute_totals(&fee, &medicines, &services, Currency::INR).unwrap();

            let expected_medicines: Decimal = medicines
                .iter()
                .map(|l| l.price.amount() * Decimal::from(l.quantity))
                .sum();
            let expected_services: Decimal = services.iter().map(|l| l.price.amount()).sum();

            prop_assert_eq!(totals.medicines_total.amount(), expected_medicines);
            prop_assert_eq!(totals.services_total.amount(), expected_services);
            prop_assert_eq!(
                totals.total_amount.amount(),
                fee.amount() + expected_medicines + expected_services
            );
        }
    }
}

// ============================================================================
// Payment state
// ============================================================================

mod payment_tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert!(PaymentStatus::Pending.is_outstanding());
        assert!(PaymentStatus::Partial.is_outstanding());
        assert!(!PaymentStatus::Paid.is_outstanding());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentStatus::Partial).unwrap(), "\"partial\"");
        assert_eq!(serde_json::to_string(&PaymentMethod::Upi).unwrap(), "\"upi\"");
        assert_eq!("PAID".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert!("card".parse::<PaymentMethod>().is_err());
    }
}

// ============================================================================
// Queries
// ============================================================================

mod query_tests {
    use super::*;

    #[test]
    fn test_date_window_is_half_open() {
        let b = bill("BILL001", "Kavya", 0);
        let at = b.created_at;
        assert!(BillQuery::between(at, at + Duration::seconds(1)).matches(&b));
        assert!(!BillQuery::between(at - Duration::hours(1), at).matches(&b));
    }

    #[test]
    fn test_filters() {
        let mut b = bill("BILL042", "Kavya Nair", 3);
        b.payment_status = PaymentStatus::Paid;

        let paid = BillQuery {
            payment_status: Some(PaymentStatus::Paid),
            ..Default::default()
        };
        assert!(paid.matches(&b));

        let for_other = BillQuery {
            patient: Some(PatientId::new()),
            ..Default::default()
        };
        assert!(!for_other.matches(&b));

        let by_code = BillQuery {
            search: Some("bill042".to_string()),
            ..Default::default()
        };
        assert!(by_code.matches(&b));

        let by_name = BillQuery {
            search: Some("nair".to_string()),
            ..Default::default()
        };
        assert!(by_name.matches(&b));
    }
}

// ============================================================================
// Errors
// ============================================================================

mod error_tests {
    use super::*;

    #[test]
    fn test_port_errors_map_to_ledger_kinds() {
        assert!(matches!(
            LedgerError::from(PortError::not_found("bill", "BILL009")),
            LedgerError::NotFound(_)
        ));
        assert!(matches!(
            LedgerError::from(PortError::duplicate("bill", "BILL009")),
            LedgerError::IdentifierConflict(_)
        ));
        assert!(matches!(
            LedgerError::from(PortError::connection("pool closed")),
            LedgerError::StorageUnavailable(_)
        ));
    }

    #[test]
    fn test_insufficient_stock_keeps_details() {
        let err = LedgerError::from(InventoryError::InsufficientStock {
            medicine: "Amoxicillin".to_string(),
            available: 4,
            requested: 6,
        });
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Amoxicillin: only 4 left, 6 requested"
        );
    }
}
