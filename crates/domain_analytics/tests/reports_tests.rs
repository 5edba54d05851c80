//! Report computation tests

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{BillId, Currency, MedicineId, Money, PatientId, ServiceId};
use domain_analytics::{revenue_breakdown, revenue_trend, top_medicines, top_services, DateWindow};
use domain_billing::{Bill, MedicineLine, PaymentStatus, ServiceLine};

fn inr(amount: Decimal) -> Money {
    Money::new(amount, Currency::INR)
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}

fn bill(created_at: DateTime<Utc>, fee: Decimal, medicines: Vec<MedicineLine>, services: Vec<ServiceLine>) -> Bill {
    let mut bill = Bill {
        id: BillId::new_v7(),
        code: "BILL001".to_string(),
        patient: PatientId::new(),
        patient_name: "Test".to_string(),
        patient_phone: "9000000000".to_string(),
        consultation_fee: inr(fee),
        medicines,
        services,
        medicines_total: inr(dec!(0)),
        services_total: inr(dec!(0)),
        total_amount: inr(dec!(0)),
        payment_status: PaymentStatus::Paid,
        payment_method: None,
        notes: None,
        created_at,
        updated_at: created_at,
    };
    bill.refresh_totals().unwrap();
    bill
}

fn service(id: ServiceId, name: &str, price: Decimal) -> ServiceLine {
    ServiceLine {
        service: id,
        name: name.to_string(),
        price: inr(price),
    }
}

#[test]
fn test_breakdown_shares_round_down() {
    let bills = vec![bill(
        at(1, 10),
        dec!(500),
        vec![MedicineLine::new(MedicineId::new(), "Paracetamol", inr(dec!(50)), 2).unwrap()],
        vec![service(ServiceId::new(), "Dressing", dec!(300))],
    )];
    let breakdown = revenue_breakdown(&bills, Currency::INR);

    assert_eq!(breakdown.total.amount(), dec!(900));
    // 55.5 / 11.1 / 33.3
    assert_eq!(breakdown.consultation_share, 55);
    assert_eq!(breakdown.medicines_share, 11);
    assert_eq!(breakdown.services_share, 33);
    assert_eq!(breakdown.bill_count, 1);
}

#[test]
fn test_trend_fills_empty_days() {
    let window = DateWindow::days(at(1, 0).date_naive(), at(3, 0).date_naive()).unwrap();
    let bills = vec![
        bill(at(1, 9), dec!(500), vec![], vec![]),
        bill(at(1, 17), dec!(300), vec![], vec![]),
        bill(at(3, 12), dec!(200), vec![], vec![]),
        bill(at(4, 12), dec!(999), vec![], vec![]),
    ];

    let trend = revenue_trend(&bills, &window, Currency::INR);

    assert_eq!(trend.len(), 3);
    assert_eq!(trend[0].revenue.amount(), dec!(800));
    assert_eq!(trend[0].bills, 2);
    assert!(trend[1].revenue.is_zero());
    assert_eq!(trend[1].bills, 0);
    assert_eq!(trend[2].revenue.amount(), dec!(200));
}

#[test]
fn test_top_services_ranked_by_revenue_then_count() {
    let xray = ServiceId::new();
    let dressing = ServiceId::new();
    let ecg = ServiceId::new();
    let bills = vec![
        bill(at(2, 10), dec!(0), vec![], vec![service(xray, "X-Ray", dec!(600))]),
        bill(at(2, 11), dec!(0), vec![], vec![service(dressing, "Dressing", dec!(300)), service(dressing, "Dressing", dec!(300))]),
        bill(at(2, 12), dec!(0), vec![], vec![service(ecg, "ECG", dec!(250))]),
    ];

    let top = top_services(&bills, 2, Currency::INR);

    assert_eq!(top.len(), 2);
    // X-Ray and Dressing tie on revenue; Dressing was billed more often
    assert_eq!(top[0].name, "Dressing");
    assert_eq!(top[0].quantity, 2);
    assert_eq!(top[0].bills, 1);
    assert_eq!(top[1].name, "X-Ray");
}

#[test]
fn test_top_medicines_sum_units_across_bills() {
    let amox = MedicineId::new();
    let bills = vec![
        bill(at(2, 10), dec!(0), vec![MedicineLine::new(amox, "Amoxicillin", inr(dec!(12)), 10).unwrap()], vec![]),
        bill(at(2, 11), dec!(0), vec![MedicineLine::new(amox, "Amoxicillin", inr(dec!(12)), 5).unwrap()], vec![]),
        bill(at(2, 12), dec!(0), vec![MedicineLine::new(MedicineId::new(), "ORS", inr(dec!(20)), 1).unwrap()], vec![]),
    ];

    let top = top_medicines(&bills, 10, Currency::INR);

    assert_eq!(top[0].name, "Amoxicillin");
    assert_eq!(top[0].quantity, 15);
    assert_eq!(top[0].bills, 2);
    assert_eq!(top[0].revenue.amount(), dec!(180));
    assert_eq!(top[1].name, "ORS");
}

proptest! {
    #[test]
    fn prop_breakdown_shares_never_exceed_100(
        fees in prop::collection::vec(0i64..100_000, 0..8),
        prices in prop::collection::vec(0i64..100_000, 0..8),
    ) {
        let start = at(10, 0);
        let bills: Vec<Bill> = fees
            .iter()
            .zip(prices.iter().chain(std::iter::repeat(&0)))
            .enumerate()
            .map(|(i, (fee, price))| {
                bill(
                    start + Duration::minutes(i as i64),
                    Decimal::new(*fee, 2),
                    vec![],
                    vec![service(ServiceId::new(), "S", Decimal::new(*price, 2))],
                )
            })
            .collect();

        let breakdown = revenue_breakdown(&bills, Currency::INR);
        let shares = breakdown.consultation_share + breakdown.medicines_share + breakdown.services_share;
        prop_assert!(shares <= 100);
        if !breakdown.total.is_zero() {
            prop_assert!(shares >= 98);
        }
    }
}
