//! Billing ledger errors

use core_kernel::{MoneyError, PortError};
use domain_inventory::InventoryError;
use thiserror::Error;

/// Errors surfaced by the billing ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The bill, patient, medicine or service does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A bill asked for more units of a medicine than are on the shelf
    #[error("Insufficient stock for {medicine}: only {available} left, {requested} requested")]
    InsufficientStock {
        medicine: String,
        available: u32,
        requested: u32,
    },

    /// No free `BILL` code could be issued within the retry budget
    #[error("Identifier conflict: {0}")]
    IdentifierConflict(String),

    /// The request is malformed; nothing was written
    #[error("Validation error: {0}")]
    Validation(String),

    /// The store failed, or kept rejecting the commit as concurrently modified
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        LedgerError::NotFound(format!("{entity} {id}"))
    }
}

impl From<PortError> for LedgerError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => LedgerError::NotFound(format!("{entity_type} {id}")),
            PortError::Validation { message, .. } => LedgerError::Validation(message),
            PortError::Duplicate { value, .. } => LedgerError::IdentifierConflict(value),
            other => LedgerError::StorageUnavailable(other.to_string()),
        }
    }
}

impl From<MoneyError> for LedgerError {
    fn from(err: MoneyError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

impl From<InventoryError> for LedgerError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientStock {
                medicine,
                available,
                requested,
            } => LedgerError::InsufficientStock {
                medicine,
                available,
                requested,
            },
            InventoryError::NotFound(id) => LedgerError::NotFound(format!("medicine {id}")),
            InventoryError::Validation(message) => LedgerError::Validation(message),
            InventoryError::IdentifierConflict(code) => LedgerError::IdentifierConflict(code),
            InventoryError::Conflict(message) | InventoryError::StorageUnavailable(message) => {
                LedgerError::StorageUnavailable(message)
            }
        }
    }
}
