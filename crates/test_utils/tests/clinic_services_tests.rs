//! Patients, inventory, catalog and analytics working over one store

use chrono::{Duration, Utc};
use domain_analytics::DateWindow;
use domain_billing::{PaymentStatus, PaymentUpdate};
use domain_catalog::ServiceQuery;
use domain_inventory::{MedicineQuery, MedicineStatus, StockOperation};
use domain_patient::{NewVisit, PatientError, PatientQuery, PatientStatus, PatientUpdate};
use rust_decimal_macros::dec;
use test_utils::{
    assert_amount, Clinic, DateFixtures, InvoiceRequestBuilder, MedicineDetailsBuilder, PatientDetailsBuilder,
};

#[tokio::test]
async fn test_patient_codes_and_lookup() {
    let clinic = Clinic::in_memory();
    let first = clinic.add_patient().await;
    let second = clinic.add_patient().await;

    assert_eq!(first.code, "DOC001");
    assert_eq!(second.code, "DOC002");
    assert_eq!(first.status, PatientStatus::Active);

    let found = clinic.patients.get_patient_by_code("DOC002").await.unwrap();
    assert_eq!(found.id, second.id);
}

#[tokio::test]
async fn test_invalid_patient_burns_no_code() {
    let clinic = Clinic::in_memory();

    let err = clinic
        .patients
        .create_patient(PatientDetailsBuilder::new().with_name("  ").build())
        .await
        .unwrap_err();
    assert!(matches!(err, PatientError::Validation(_)));

    let patient = clinic.add_patient().await;
    assert_eq!(patient.code, "DOC001");
}

#[tokio::test]
async fn test_visit_reactivates_patient() {
    let clinic = Clinic::in_memory();
    let patient = clinic.add_patient().await;

    let inactive = clinic
        .patients
        .update_patient(
            patient.id,
            PatientUpdate {
                status: Some(PatientStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(inactive.status, PatientStatus::Inactive);

    let visited = clinic
        .patients
        .record_visit(patient.id, NewVisit::new("Viral fever", "Dr. Rao"))
        .await
        .unwrap();
    assert_eq!(visited.status, PatientStatus::Active);
    assert_eq!(visited.visits.len(), 1);
    assert_eq!(visited.last_visit, Some(visited.visits[0].date));
}

#[tokio::test]
async fn test_patient_search_and_pages() {
    let clinic = Clinic::in_memory();
    clinic
        .patients
        .create_patient(PatientDetailsBuilder::new().with_name("Asha Verma").build())
        .await
        .unwrap();
    for _ in 0..4 {
        clinic.add_patient().await;
    }

    let (found, total) = clinic.patients.list_patients(&PatientQuery::search("asha")).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(found[0].name, "Asha Verma");

    let (page, total) = clinic
        .patients
        .list_patients(&PatientQuery::default().paginate(2, 2))
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(page.len(), 2);
}

#[tokio::test]
async fn test_deleted_patient_is_gone() {
    let clinic = Clinic::in_memory();
    let patient = clinic.add_patient().await;

    clinic.patients.delete_patient(patient.id).await.unwrap();

    let err = clinic.patients.get_patient(patient.id).await.unwrap_err();
    assert!(matches!(err, PatientError::NotFound(_)));
}

#[tokio::test]
async fn test_stock_alerts_group_by_status() {
    let clinic = Clinic::in_memory();
    let low = clinic
        .inventory
        .create_medicine(
            MedicineDetailsBuilder::new()
                .with_stock(10)
                .with_min_stock_level(10)
                .with_expiry_date(DateFixtures::expiry_in(60))
                .build(),
        )
        .await
        .unwrap();
    let expiring = clinic
        .inventory
        .create_medicine(
            MedicineDetailsBuilder::new()
                .with_stock(5)
                .with_min_stock_level(10)
                .with_expiry_date(DateFixtures::expiry_in(10))
                .build(),
        )
        .await
        .unwrap();
    let healthy = clinic.add_medicine(dec!(30), 200, 10).await;
    let empty = clinic.add_medicine(dec!(30), 50, 10).await;
    clinic
        .inventory
        .adjust_stock(empty.id, 80, StockOperation::Subtract)
        .await
        .unwrap();

    assert_eq!(low.status, MedicineStatus::LowStock);
    assert_eq!(expiring.status, MedicineStatus::ExpiringSoon);
    assert_eq!(healthy.status, MedicineStatus::InStock);

    let alerts = clinic.inventory.stock_alerts().await.unwrap();
    let ids = |list: &[domain_inventory::Medicine]| list.iter().map(|m| m.id).collect::<Vec<_>>();
    assert_eq!(ids(&alerts.low_stock), vec![low.id]);
    assert_eq!(ids(&alerts.expiring_soon), vec![expiring.id]);
    assert_eq!(ids(&alerts.out_of_stock), vec![empty.id]);

    let (out, total) = clinic
        .inventory
        .list_medicines(&MedicineQuery::by_status(MedicineStatus::OutOfStock))
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(out[0].stock, 0);
}

#[tokio::test]
async fn test_medicine_lookup_by_code() {
    let clinic = Clinic::in_memory();
    let medicine = clinic.add_medicine(dec!(15), 20, 5).await;

    assert_eq!(medicine.code, "MED001");
    let found = clinic.inventory.get_medicine_by_code("MED001").await.unwrap();
    assert_eq!(found.id, medicine.id);
    assert_eq!(found.profit_per_unit().amount(), dec!(6));
}

#[tokio::test]
async fn test_deactivated_service_hidden_by_default() {
    let clinic = Clinic::in_memory();
    let dressing = clinic.add_service(dec!(300)).await;
    let _xray = clinic.add_service(dec!(800)).await;

    assert_eq!(dressing.code, "SER001");
    let deactivated = clinic.catalog.deactivate_service(dressing.id).await.unwrap();
    assert!(!deactivated.is_active);

    let active = clinic.catalog.list_services(&ServiceQuery::default()).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].code, "SER002");

    let everything = clinic
        .catalog
        .list_services(&ServiceQuery {
            include_inactive: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(everything.len(), 2);
}

#[tokio::test]
async fn test_dashboard_reflects_todays_bills() {
    let clinic = Clinic::in_memory();
    let patient = clinic.add_patient().await;
    let medicine = clinic.add_medicine(dec!(50), 12, 10).await;
    let service = clinic.add_service(dec!(300)).await;

    clinic
        .ledger
        .create_invoice(
            InvoiceRequestBuilder::for_patient(patient.id)
                .with_medicine(medicine.id, 2)
                .with_service(service.id)
                .build(),
        )
        .await
        .unwrap();
    clinic
        .ledger
        .create_invoice(
            InvoiceRequestBuilder::for_patient(patient.id)
                .with_fee(dec!(400))
                .paid_by(domain_billing::PaymentMethod::Upi)
                .build(),
        )
        .await
        .unwrap();

    let summary = clinic.analytics.dashboard_summary(Utc::now()).await.unwrap();
    assert_eq!(summary.today_bills, 2);
    assert_amount(&summary.today_revenue, dec!(1300));
    assert_eq!(summary.yesterday_bills, 0);
    assert_eq!(summary.total_patients, 1);
    assert_eq!(summary.new_patients_this_month, 1);
    assert_eq!(summary.outstanding_bills, 1);
    assert_amount(&summary.outstanding_amount, dec!(900));
    // 12 - 2 leaves the medicine at its minimum level
    assert_eq!(summary.low_stock_medicines, 1);

    let window = DateWindow::last_days(7, Utc::now()).unwrap();
    let breakdown = clinic.analytics.revenue_breakdown(window).await.unwrap();
    assert_eq!(breakdown.bill_count, 2);
    assert_amount(&breakdown.consultation, dec!(900));
    assert_amount(&breakdown.medicines, dec!(100));
    assert_amount(&breakdown.services, dec!(300));
    assert_amount(&breakdown.total, dec!(1300));

    let trend = clinic.analytics.revenue_trend(window).await.unwrap();
    assert_eq!(trend.len(), 7);
    let today = trend.last().unwrap();
    assert_eq!(today.date, Utc::now().date_naive());
    assert_eq!(today.bills, 2);

    let top = clinic.analytics.top_medicines(window, 5).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].name, medicine.name);
    assert_eq!(top[0].quantity, 2);
    assert_amount(&top[0].revenue, dec!(100));
}

#[tokio::test]
async fn test_dashboard_counts_only_unpaid_bills_and_this_months_patients() {
    let clinic = Clinic::in_memory();
    let patient = clinic.add_patient().await;

    let mut bills = Vec::new();
    for fee in [dec!(100), dec!(200), dec!(400)] {
        let bill = clinic
            .ledger
            .create_invoice(InvoiceRequestBuilder::for_patient(patient.id).with_fee(fee).build())
            .await
            .unwrap();
        bills.push(bill);
    }
    for (bill, status) in bills.iter().zip([PaymentStatus::Paid, PaymentStatus::Partial]) {
        clinic
            .ledger
            .update_invoice_payment(
                bill.id,
                PaymentUpdate {
                    payment_status: Some(status),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    let summary = clinic.analytics.dashboard_summary(Utc::now()).await.unwrap();
    assert_eq!(summary.outstanding_bills, 2);
    assert_amount(&summary.outstanding_amount, dec!(600));
    assert_eq!(summary.new_patients_this_month, 1);

    let next_month = Utc::now() + Duration::days(40);
    let later = clinic.analytics.dashboard_summary(next_month).await.unwrap();
    assert_eq!(later.total_patients, 1);
    assert_eq!(later.new_patients_this_month, 0);
}

#[tokio::test]
async fn test_empty_window_is_rejected() {
    let err = DateWindow::last_days(0, Utc::now()).unwrap_err();
    assert!(matches!(err, domain_analytics::AnalyticsError::InvalidWindow(_)));
}
