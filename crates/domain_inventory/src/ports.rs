//! Inventory Domain Ports

use async_trait::async_trait;

use core_kernel::{DomainPort, MedicineId, PortError};

use crate::medicine::Medicine;
use crate::status::MedicineStatus;

/// Query parameters for listing medicines
#[derive(Debug, Clone, Default)]
pub struct MedicineQuery {
    /// Case-insensitive match on name, generic name or `MED` code
    pub search: Option<String>,
    /// Exact category match (case-insensitive)
    pub category: Option<String>,
    /// Filter by stored status
    pub status: Option<MedicineStatus>,
    /// Limit results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

impl MedicineQuery {
    /// Creates a query for one status
    pub fn by_status(status: MedicineStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Whether `medicine` passes the filters (pagination aside)
    pub fn matches(&self, medicine: &Medicine) -> bool {
        if let Some(status) = self.status {
            if medicine.status != status {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !medicine.category.eq_ignore_ascii_case(category.trim()) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => medicine.matches_search(term),
            _ => true,
        }
    }
}

/// Storage port for medicines
///
/// Writes to an existing medicine are conditional on its `version`: the store
/// applies them only when the stored version still equals the one the caller
/// read, and bumps the version when it does.
#[async_trait]
pub trait MedicinePort: DomainPort {
    /// Retrieves a medicine by storage key
    async fn get_medicine(&self, id: MedicineId) -> Result<Medicine, PortError>;

    /// Retrieves a medicine by its `MED` code
    async fn get_medicine_by_code(&self, code: &str) -> Result<Medicine, PortError>;

    /// Lists medicines matching the query, ordered by name
    async fn find_medicines(&self, query: &MedicineQuery) -> Result<Vec<Medicine>, PortError>;

    /// Counts medicines matching the query, ignoring pagination
    async fn count_medicines(&self, query: &MedicineQuery) -> Result<u64, PortError>;

    /// Inserts a new medicine
    ///
    /// Fails with `PortError::Duplicate` when the code is already taken.
    async fn insert_medicine(&self, medicine: &Medicine) -> Result<(), PortError>;

    /// Replaces a medicine if its stored version is still `expected_version`
    ///
    /// Returns the stored copy with its new version, `PortError::Conflict`
    /// when another writer got there first, or `PortError::NotFound`.
    async fn replace_medicine(
        &self,
        medicine: &Medicine,
        expected_version: u64,
    ) -> Result<Medicine, PortError>;

    /// Removes a medicine
    async fn delete_medicine(&self, id: MedicineId) -> Result<(), PortError>;
}
