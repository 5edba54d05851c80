//! Inventory domain errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the inventory domain
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Medicine with the given id or code was not found
    #[error("Medicine not found: {0}")]
    NotFound(String),

    /// A withdrawal asked for more units than are on the shelf
    #[error("Insufficient stock for {medicine}: available {available}, requested {requested}")]
    InsufficientStock {
        medicine: String,
        available: u32,
        requested: u32,
    },

    /// Invalid medicine data provided
    #[error("Invalid medicine data: {0}")]
    Validation(String),

    /// No free `MED` code could be issued
    #[error("Identifier conflict: {0}")]
    IdentifierConflict(String),

    /// The medicine kept changing underneath the request
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    /// The backing store could not serve the request
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl InventoryError {
    pub fn validation(message: impl Into<String>) -> Self {
        InventoryError::Validation(message.into())
    }
}

impl From<PortError> for InventoryError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { id, .. } => InventoryError::NotFound(id),
            PortError::Validation { message, .. } => InventoryError::Validation(message),
            PortError::Duplicate { value, .. } => InventoryError::IdentifierConflict(value),
            PortError::Conflict { message } => InventoryError::Conflict(message),
            other => InventoryError::StorageUnavailable(other.to_string()),
        }
    }
}
