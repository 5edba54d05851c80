//! Infrastructure Database Layer
//!
//! Storage adapters for the clinic ledger. Two stores implement every domain
//! port:
//!
//! - [`MemoryStore`]: process-local documents behind one async lock, used for
//!   development, demos and tests
//! - [`PgStore`]: PostgreSQL through SQLx, with JSONB line items and
//!   version-guarded medicine writes
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/clinic")).await?;
//! run_migrations(&pool).await?;
//! let store = std::sync::Arc::new(PgStore::new(pool));
//! let ledger = LedgerService::new(store, BillingSettings::default());
//! ```

pub mod pool;
pub mod error;
pub mod memory;
pub mod postgres;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

use core_kernel::{HealthCheckable, SequencePort};
use domain_billing::BillPort;
use domain_catalog::CatalogPort;
use domain_inventory::MedicinePort;
use domain_patient::PatientPort;

/// A store that backs every clinic service
///
/// Implemented for anything that implements all the domain ports, so either
/// store can be handed to the service constructors as one `Arc`.
pub trait ClinicStore:
    PatientPort + MedicinePort + CatalogPort + BillPort + SequencePort + HealthCheckable
{
}

impl<T> ClinicStore for T where
    T: PatientPort + MedicinePort + CatalogPort + BillPort + SequencePort + HealthCheckable
{
}
