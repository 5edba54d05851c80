//! Patient domain errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the patient domain
#[derive(Debug, Error)]
pub enum PatientError {
    /// Patient with the given id or code was not found
    #[error("Patient not found: {0}")]
    NotFound(String),

    /// Invalid patient data provided
    #[error("Invalid patient data: {0}")]
    Validation(String),

    /// No free `DOC` code could be issued
    #[error("Identifier conflict: {0}")]
    IdentifierConflict(String),

    /// The record changed underneath the request
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    /// The backing store could not serve the request
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl PatientError {
    pub fn validation(message: impl Into<String>) -> Self {
        PatientError::Validation(message.into())
    }
}

impl From<PortError> for PatientError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { id, .. } => PatientError::NotFound(id),
            PortError::Validation { message, .. } => PatientError::Validation(message),
            PortError::Duplicate { value, .. } => PatientError::IdentifierConflict(value),
            PortError::Conflict { message } => PatientError::Conflict(message),
            other => PatientError::StorageUnavailable(other.to_string()),
        }
    }
}
