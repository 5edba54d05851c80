//! Pre-built Test Fixtures
//!
//! Fixed amounts and dates for unit tests, plus [`Clinic`]: every service
//! wired to one in-memory store, with helpers that seed records.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use core_kernel::{Currency, Money};
use domain_analytics::AnalyticsService;
use domain_billing::{BillingSettings, LedgerService};
use domain_catalog::{CatalogService, ServiceItem};
use domain_inventory::{InventoryService, Medicine};
use domain_patient::{Patient, PatientService};
use infra_db::MemoryStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::builders::{MedicineDetailsBuilder, PatientDetailsBuilder, ServiceDetailsBuilder};

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn inr(amount: Decimal) -> Money {
        Money::new(amount, Currency::INR)
    }

    /// The default consultation fee
    pub fn consultation_fee() -> Money {
        Money::new(dec!(500), Currency::INR)
    }

    pub fn inr_zero() -> Money {
        Money::zero(Currency::INR)
    }

    /// An amount in a currency the clinic does not bill in
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }
}

/// Fixture for dates
pub struct DateFixtures;

impl DateFixtures {
    /// A fixed mid-month instant for deterministic reports
    pub fn reference_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, 10, 30, 0).unwrap()
    }

    pub fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// `days` from today; negative values lie in the past
    pub fn expiry_in(days: i64) -> NaiveDate {
        Self::today() + Duration::days(days)
    }

    /// Comfortably outside the expiry warning window
    pub fn far_expiry() -> NaiveDate {
        Self::expiry_in(365)
    }
}

/// Every clinic service over one shared [`MemoryStore`]
pub struct Clinic {
    pub store: Arc<MemoryStore>,
    pub patients: PatientService,
    pub inventory: InventoryService,
    pub catalog: CatalogService,
    pub ledger: LedgerService,
    pub analytics: AnalyticsService,
}

impl Clinic {
    /// A fresh clinic billing in INR with a 500 consultation fee
    pub fn in_memory() -> Self {
        Self::with_settings(BillingSettings::default())
    }

    pub fn with_settings(settings: BillingSettings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let currency = settings.currency;
        Self {
            patients: PatientService::new(store.clone(), store.clone()),
            inventory: InventoryService::new(store.clone(), store.clone()),
            catalog: CatalogService::new(store.clone(), store.clone()),
            ledger: LedgerService::new(store.clone(), settings),
            analytics: AnalyticsService::new(store.clone(), currency),
            store,
        }
    }

    /// Registers a randomly named patient
    pub async fn add_patient(&self) -> Patient {
        self.patients
            .create_patient(PatientDetailsBuilder::new().build())
            .await
            .expect("patient fixture is valid")
    }

    /// Adds a medicine selling at `price` with the given shelf state
    pub async fn add_medicine(&self, price: Decimal, stock: u32, min_stock_level: u32) -> Medicine {
        let details = MedicineDetailsBuilder::new()
            .with_selling_price(price)
            .with_stock(stock)
            .with_min_stock_level(min_stock_level)
            .build();
        self.inventory
            .create_medicine(details)
            .await
            .expect("medicine fixture is valid")
    }

    /// Adds an active service priced at `price`
    pub async fn add_service(&self, price: Decimal) -> ServiceItem {
        self.catalog
            .create_service(ServiceDetailsBuilder::new().with_price(price).build())
            .await
            .expect("service fixture is valid")
    }
}
