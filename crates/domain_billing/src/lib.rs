//! Billing Domain - Clinic Invoicing Ledger
//!
//! This crate issues bills (invoices) for consultations, medicines and
//! catalog services, and couples every bill to the medicine stock it
//! consumes.
//!
//! # Invariants
//!
//! - `total_amount == consultation_fee + medicines_total + services_total`
//!   for every persisted bill; totals are always derived, never supplied
//! - Creating a bill withdraws each medicine line's quantity and deleting it
//!   restores the same quantity, each in a single atomic commit
//! - A bill that would take any medicine below zero is rejected whole
//! - Bill codes (`BILL001`, `BILL002`, ...) are unique and ordered numerically
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{CreateInvoiceRequest, LedgerService, MedicineLineRequest};
//!
//! let ledger = LedgerService::new(store, BillingSettings::default());
//! let bill = ledger.create_invoice(CreateInvoiceRequest {
//!     patient: patient.id,
//!     medicines: vec![MedicineLineRequest { medicine: paracetamol.id, quantity: 2 }],
//!     services: vec![dressing.id],
//!     ..Default::default()
//! }).await?;
//!
//! assert_eq!(bill.code, "BILL001");
//! ```

pub mod bill;
pub mod payment;
pub mod error;
pub mod ports;
pub mod ledger;

pub use bill::{compute_totals, Bill, BillTotals, MedicineLine, PaymentUpdate, ServiceLine, MAX_NOTES_LEN};
pub use payment::{PaymentMethod, PaymentStatus};
pub use error::LedgerError;
pub use ports::{BillCommit, BillDeletion, BillPort, BillQuery, MedicineWrite};
pub use ledger::{
    BillingSettings, CreateInvoiceRequest, LedgerService, MedicineLineRequest, DEFAULT_CONSULTATION_FEE,
};
