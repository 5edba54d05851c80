//! Patient Domain Ports
//!
//! `PatientPort` is everything the patient service needs from storage.
//! Both the in-memory store and the PostgreSQL store in `infra_db` implement
//! it, alongside the other clinic ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{DomainPort, PatientId, PortError};

use crate::patient::{Patient, PatientStatus, Visit};

/// Query parameters for listing patients
#[derive(Debug, Clone, Default)]
pub struct PatientQuery {
    /// Case-insensitive match on name, phone or `DOC` code
    pub search: Option<String>,
    /// Filter by status
    pub status: Option<PatientStatus>,
    /// Registered at or after
    pub created_from: Option<DateTime<Utc>>,
    /// Registered strictly before
    pub created_to: Option<DateTime<Utc>>,
    /// Limit results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

impl PatientQuery {
    /// Creates a query matching a search term
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Default::default()
        }
    }

    /// Patients registered in `[from, to)`
    pub fn registered_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            created_from: Some(from),
            created_to: Some(to),
            ..Default::default()
        }
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Whether `patient` passes the filters (pagination aside)
    pub fn matches(&self, patient: &Patient) -> bool {
        if let Some(status) = self.status {
            if patient.status != status {
                return false;
            }
        }
        if self.created_from.is_some_and(|from| patient.created_at < from)
            || self.created_to.is_some_and(|to| patient.created_at >= to)
        {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => patient.matches_search(term),
            _ => true,
        }
    }
}

/// Storage port for patient records
#[async_trait]
pub trait PatientPort: DomainPort {
    /// Retrieves a patient by storage key
    async fn get_patient(&self, id: PatientId) -> Result<Patient, PortError>;

    /// Retrieves a patient by its `DOC` code
    async fn get_patient_by_code(&self, code: &str) -> Result<Patient, PortError>;

    /// Lists patients matching the query, newest first
    async fn find_patients(&self, query: &PatientQuery) -> Result<Vec<Patient>, PortError>;

    /// Counts patients matching the query, ignoring pagination
    async fn count_patients(&self, query: &PatientQuery) -> Result<u64, PortError>;

    /// Inserts a new patient
    ///
    /// Fails with `PortError::Duplicate` when the code is already taken.
    async fn insert_patient(&self, patient: &Patient) -> Result<(), PortError>;

    /// Replaces a stored patient's editable fields
    async fn update_patient(&self, patient: &Patient) -> Result<(), PortError>;

    /// Atomically appends a visit and returns the updated patient
    async fn append_visit(&self, id: PatientId, visit: Visit) -> Result<Patient, PortError>;

    /// Removes a patient
    async fn delete_patient(&self, id: PatientId) -> Result<(), PortError>;
}
