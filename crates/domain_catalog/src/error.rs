//! Catalog domain errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the catalog domain
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Service not found: {0}")]
    NotFound(String),

    #[error("Invalid service data: {0}")]
    Validation(String),

    /// No free `SER` code could be issued
    #[error("Identifier conflict: {0}")]
    IdentifierConflict(String),

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl CatalogError {
    pub fn validation(message: impl Into<String>) -> Self {
        CatalogError::Validation(message.into())
    }
}

impl From<PortError> for CatalogError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { id, .. } => CatalogError::NotFound(id),
            PortError::Validation { message, .. } => CatalogError::Validation(message),
            PortError::Duplicate { value, .. } => CatalogError::IdentifierConflict(value),
            PortError::Conflict { message } => CatalogError::Conflict(message),
            other => CatalogError::StorageUnavailable(other.to_string()),
        }
    }
}
