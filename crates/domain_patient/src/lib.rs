//! Patient Records Domain
//!
//! Patients are filed under sequential `DOC` codes and carry an append-only
//! visit history. Billing reads patients to snapshot their name and phone onto
//! an invoice and bumps `last_visit` when a bill is committed.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use core_kernel::{SequenceKind, SequentialCode};
//! use domain_patient::{Gender, NewVisit, Patient, PatientDetails, PatientStatus};
//!
//! let details = PatientDetails::new("Asha Rao", 34, Gender::Female, "9876543210");
//! let mut patient = Patient::new(SequentialCode::first(SequenceKind::Patient), details, Utc::now()).unwrap();
//! assert_eq!(patient.code, "DOC001");
//!
//! patient.status = PatientStatus::Inactive;
//! patient.record_visit(NewVisit::new("Seasonal flu", "Dr. Mehta"), Utc::now()).unwrap();
//! assert_eq!(patient.status, PatientStatus::Active);
//! ```

pub mod patient;
pub mod error;
pub mod ports;
pub mod services;

pub use patient::{Gender, NewVisit, Patient, PatientDetails, PatientStatus, PatientUpdate, Visit};
pub use error::PatientError;
pub use ports::{PatientPort, PatientQuery};
pub use services::PatientService;
