//! Test Utilities Crate
//!
//! Shared test infrastructure for the clinic ledger.
//!
//! # Modules
//!
//! - `fixtures`: fixed amounts and dates, and a [`Clinic`] over an in-memory store
//! - `builders`: builders for patients, medicines, services and invoice requests
//! - `database`: a migrated PostgreSQL test container
//! - `assertions`: assertions for bill totals, medicine status and codes
//! - `generators`: proptest strategies

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
