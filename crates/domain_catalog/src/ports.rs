//! Catalog Domain Ports

use async_trait::async_trait;

use core_kernel::{DomainPort, PortError, ServiceId};

use crate::service::ServiceItem;

/// Query parameters for listing services
#[derive(Debug, Clone, Default)]
pub struct ServiceQuery {
    /// Include deactivated services
    pub include_inactive: bool,
    /// Exact category match (case-insensitive)
    pub category: Option<String>,
    /// Case-insensitive match on name or `SER` code
    pub search: Option<String>,
}

impl ServiceQuery {
    /// Active services only
    pub fn active() -> Self {
        Self::default()
    }

    pub fn matches(&self, service: &ServiceItem) -> bool {
        if !self.include_inactive && !service.is_active {
            return false;
        }
        if let Some(category) = &self.category {
            if !service.category.eq_ignore_ascii_case(category.trim()) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => service.matches_search(term),
            _ => true,
        }
    }
}

/// Storage port for the service catalog
#[async_trait]
pub trait CatalogPort: DomainPort {
    async fn get_service(&self, id: ServiceId) -> Result<ServiceItem, PortError>;

    async fn get_service_by_code(&self, code: &str) -> Result<ServiceItem, PortError>;

    /// Lists services matching the query, ordered by name
    async fn find_services(&self, query: &ServiceQuery) -> Result<Vec<ServiceItem>, PortError>;

    /// Inserts a new service
    ///
    /// Fails with `PortError::Duplicate` when the code is already taken.
    async fn insert_service(&self, service: &ServiceItem) -> Result<(), PortError>;

    async fn update_service(&self, service: &ServiceItem) -> Result<(), PortError>;
}
