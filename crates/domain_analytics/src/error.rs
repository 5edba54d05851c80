//! Analytics errors

use core_kernel::PortError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Invalid report window: {0}")]
    InvalidWindow(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<PortError> for AnalyticsError {
    fn from(err: PortError) -> Self {
        AnalyticsError::StorageUnavailable(err.to_string())
    }
}
