//! Ledger workflows against PostgreSQL
//!
//! These start a container and need Docker: `cargo test -- --ignored`

use std::sync::Arc;

use core_kernel::{AdapterHealth, HealthCheckable, SequenceKind, SequentialCode};
use domain_billing::{BillQuery, BillingSettings, LedgerError, LedgerService, PaymentStatus, PaymentUpdate};
use domain_catalog::CatalogService;
use domain_inventory::{InventoryService, MedicineStatus};
use domain_patient::PatientService;
use infra_db::PgStore;
use rust_decimal_macros::dec;
use test_utils::{
    assert_amount, assert_bill_totals_consistent, assert_codes_distinct, InvoiceRequestBuilder,
    MedicineDetailsBuilder, PatientDetailsBuilder, ServiceDetailsBuilder, TestDatabase,
};

struct PgClinic {
    _db: TestDatabase,
    store: Arc<PgStore>,
    patients: PatientService,
    inventory: InventoryService,
    catalog: CatalogService,
    ledger: LedgerService,
}

impl PgClinic {
    async fn start() -> Self {
        let db = TestDatabase::new().await.expect("postgres container starts");
        let store = db.store();
        Self {
            patients: PatientService::new(store.clone(), store.clone()),
            inventory: InventoryService::new(store.clone(), store.clone()),
            catalog: CatalogService::new(store.clone(), store.clone()),
            ledger: LedgerService::new(store.clone(), BillingSettings::default()),
            store,
            _db: db,
        }
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_store_reports_healthy() {
    let clinic = PgClinic::start().await;
    let health = clinic.store.health_check().await;
    assert_eq!(health.status, AdapterHealth::Healthy);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_bill_round_trip_moves_stock() {
    let clinic = PgClinic::start().await;
    let patient = clinic
        .patients
        .create_patient(PatientDetailsBuilder::new().build())
        .await
        .unwrap();
    let medicine = clinic
        .inventory
        .create_medicine(
            MedicineDetailsBuilder::new()
                .with_selling_price(dec!(50))
                .with_stock(10)
                .build(),
        )
        .await
        .unwrap();
    let service = clinic
        .catalog
        .create_service(ServiceDetailsBuilder::new().with_price(dec!(300)).build())
        .await
        .unwrap();

    let bill = clinic
        .ledger
        .create_invoice(
            InvoiceRequestBuilder::for_patient(patient.id)
                .with_fee(dec!(500))
                .with_medicine(medicine.id, 2)
                .with_service(service.id)
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(bill.code, "BILL001");
    assert_amount(&bill.total_amount, dec!(900));

    let stored = clinic.ledger.get_invoice_by_code("BILL001").await.unwrap();
    assert_eq!(stored.id, bill.id);
    assert_eq!(stored.medicines.len(), 1);
    assert_bill_totals_consistent(&stored);
    assert_eq!(clinic.inventory.get_medicine(medicine.id).await.unwrap().stock, 8);
    assert!(clinic.patients.get_patient(patient.id).await.unwrap().last_visit.is_some());

    let paid = clinic
        .ledger
        .update_invoice_payment(
            bill.id,
            PaymentUpdate {
                payment_status: Some(PaymentStatus::Paid),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(paid.total_amount, bill.total_amount);

    clinic.ledger.delete_invoice(bill.id).await.unwrap();
    assert_eq!(clinic.inventory.get_medicine(medicine.id).await.unwrap().stock, 10);
    assert_eq!(clinic.ledger.count_invoices(&BillQuery::default()).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_oversell_rolls_back_everything() {
    let clinic = PgClinic::start().await;
    let patient = clinic
        .patients
        .create_patient(PatientDetailsBuilder::new().build())
        .await
        .unwrap();
    let medicine = clinic
        .inventory
        .create_medicine(MedicineDetailsBuilder::new().with_stock(3).with_min_stock_level(1).build())
        .await
        .unwrap();

    let err = clinic
        .ledger
        .create_invoice(
            InvoiceRequestBuilder::for_patient(patient.id)
                .with_medicine(medicine.id, 4)
                .build(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientStock { available: 3, requested: 4, .. }));
    assert_eq!(clinic.inventory.get_medicine(medicine.id).await.unwrap().stock, 3);
    assert!(clinic.patients.get_patient(patient.id).await.unwrap().last_visit.is_none());

    let sold_out = clinic
        .ledger
        .create_invoice(
            InvoiceRequestBuilder::for_patient(patient.id)
                .with_medicine(medicine.id, 3)
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(sold_out.code, "BILL001");
    let medicine = clinic.inventory.get_medicine(medicine.id).await.unwrap();
    assert_eq!(medicine.status, MedicineStatus::OutOfStock);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_concurrent_bills_share_stock_safely() {
    let clinic = Arc::new(PgClinic::start().await);
    let patient = clinic
        .patients
        .create_patient(PatientDetailsBuilder::new().build())
        .await
        .unwrap();
    let medicine = clinic
        .inventory
        .create_medicine(MedicineDetailsBuilder::new().with_stock(4).with_min_stock_level(1).build())
        .await
        .unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..10 {
        let clinic = clinic.clone();
        let request = InvoiceRequestBuilder::for_patient(patient.id)
            .with_medicine(medicine.id, 1)
            .build();
        tasks.spawn(async move { clinic.ledger.create_invoice(request).await });
    }

    let mut issued = 0usize;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => issued += 1,
            Err(LedgerError::InsufficientStock { .. })
            | Err(LedgerError::StorageUnavailable(_))
            | Err(LedgerError::IdentifierConflict(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert!(issued <= 4);
    let remaining = clinic.inventory.get_medicine(medicine.id).await.unwrap().stock;
    assert_eq!(remaining as usize, 4 - issued);
    assert_eq!(
        clinic.ledger.count_invoices(&BillQuery::default()).await.unwrap() as usize,
        issued
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_identifiers_survive_concurrency_and_widen() {
    let clinic = Arc::new(PgClinic::start().await);

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..20 {
        let clinic = clinic.clone();
        tasks.spawn(async move { clinic.ledger.next_identifier(SequenceKind::Medicine).await });
    }
    let mut codes: Vec<SequentialCode> = Vec::new();
    while let Some(result) = tasks.join_next().await {
        codes.push(result.unwrap().unwrap());
    }
    assert_codes_distinct(&codes);
    assert_eq!(codes.iter().map(SequentialCode::number).max(), Some(20));

    for _ in 0..998 {
        clinic.ledger.next_identifier(SequenceKind::Bill).await.unwrap();
    }
    let last_narrow = clinic.ledger.next_identifier(SequenceKind::Bill).await.unwrap();
    let first_wide = clinic.ledger.next_identifier(SequenceKind::Bill).await.unwrap();
    assert_eq!(last_narrow.to_string(), "BILL999");
    assert_eq!(first_wide.to_string(), "BILL1000");
}
