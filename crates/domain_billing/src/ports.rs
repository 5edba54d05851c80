//! Billing Domain Ports
//!
//! Creating or deleting a bill touches three aggregates at once: the bill,
//! the medicines whose stock it moves, and the patient's last visit. The
//! [`BillPort`] therefore accepts the whole change set and applies it in one
//! transaction (PostgreSQL) or one critical section (in-memory store).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{BillId, DomainPort, PatientId, PortError};
use domain_inventory::Medicine;

use crate::bill::Bill;
use crate::payment::PaymentStatus;

/// Query parameters for listing bills
#[derive(Debug, Clone, Default)]
pub struct BillQuery {
    /// Created at or after
    pub from: Option<DateTime<Utc>>,
    /// Created strictly before
    pub to: Option<DateTime<Utc>>,
    pub patient: Option<PatientId>,
    pub payment_status: Option<PaymentStatus>,
    /// Case-insensitive match on bill code, patient name or phone
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl BillQuery {
    /// Bills created in `[from, to)`
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        }
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Whether `bill` passes the filters (pagination aside)
    pub fn matches(&self, bill: &Bill) -> bool {
        if self.from.is_some_and(|from| bill.created_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| bill.created_at >= to) {
            return false;
        }
        if self.patient.is_some_and(|patient| bill.patient != patient) {
            return false;
        }
        if self.payment_status.is_some_and(|status| bill.payment_status != status) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => bill.matches_search(term),
            _ => true,
        }
    }
}

/// A medicine to write back, guarded by the version it was read at
#[derive(Debug, Clone)]
pub struct MedicineWrite {
    pub medicine: Medicine,
    pub expected_version: u64,
}

/// Everything written when a bill is created
#[derive(Debug, Clone)]
pub struct BillCommit {
    pub bill: Bill,
    /// Medicines with their stock already withdrawn
    pub medicines: Vec<MedicineWrite>,
}

impl BillCommit {
    /// The patient whose last visit moves to the bill's creation time
    pub fn patient(&self) -> PatientId {
        self.bill.patient
    }

    pub fn visited_at(&self) -> DateTime<Utc> {
        self.bill.created_at
    }
}

/// Everything written when a bill is deleted
#[derive(Debug, Clone)]
pub struct BillDeletion {
    pub bill: BillId,
    /// Medicines with their stock already restored
    pub medicines: Vec<MedicineWrite>,
}

/// Storage port for bills
#[async_trait]
pub trait BillPort: DomainPort {
    async fn get_bill(&self, id: BillId) -> Result<Bill, PortError>;

    async fn get_bill_by_code(&self, code: &str) -> Result<Bill, PortError>;

    /// Lists bills matching the query, newest first
    async fn find_bills(&self, query: &BillQuery) -> Result<Vec<Bill>, PortError>;

    /// Counts bills matching the query, ignoring pagination
    async fn count_bills(&self, query: &BillQuery) -> Result<u64, PortError>;

    /// Atomically inserts the bill, writes every medicine and bumps the
    /// patient's last visit
    ///
    /// Nothing is written when any part fails:
    /// - `PortError::Duplicate` when the bill code is taken
    /// - `PortError::Conflict` when a medicine's version moved
    /// - `PortError::NotFound` when the patient or a medicine is gone
    async fn commit_bill(&self, commit: &BillCommit) -> Result<(), PortError>;

    /// Replaces a bill's payment fields, notes and totals
    async fn update_bill(&self, bill: &Bill) -> Result<(), PortError>;

    /// Atomically deletes the bill and writes every restored medicine
    ///
    /// Fails with `PortError::Conflict` when a medicine's version moved or the
    /// medicine was deleted meanwhile, and `PortError::NotFound` when the bill
    /// is already gone.
    async fn commit_deletion(&self, deletion: &BillDeletion) -> Result<(), PortError>;
}
