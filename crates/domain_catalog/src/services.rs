//! Catalog application service

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use core_kernel::{insert_with_code, PortError, SequenceKind, SequencePort, SequentialCode, ServiceId};

use crate::error::CatalogError;
use crate::ports::{CatalogPort, ServiceQuery};
use crate::service::{ServiceDetails, ServiceItem, ServiceUpdate};

/// Attempts at issuing a free `SER` code before giving up
pub const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogPort>,
    sequences: Arc<dyn SequencePort>,
    max_code_attempts: u32,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogPort>, sequences: Arc<dyn SequencePort>) -> Self {
        Self {
            catalog,
            sequences,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
        }
    }

    /// Adds a service under the next `SER` code
    #[instrument(skip(self, details), fields(name = %details.name))]
    pub async fn create_service(&self, details: ServiceDetails) -> Result<ServiceItem, CatalogError> {
        let now = Utc::now();
        ServiceItem::new(SequentialCode::first(SequenceKind::Service), details.clone(), now)?;

        let catalog = &self.catalog;
        let service = insert_with_code(
            self.sequences.as_ref(),
            SequenceKind::Service,
            self.max_code_attempts,
            |code| {
                let details = details.clone();
                async move {
                    let service = ServiceItem::new(code, details, now)
                        .map_err(|e| PortError::validation(e.to_string()))?;
                    catalog.insert_service(&service).await?;
                    Ok(service)
                }
            },
        )
        .await?;

        info!(service_code = %service.code, price = %service.price, "service added to catalog");
        Ok(service)
    }

    pub async fn get_service(&self, id: ServiceId) -> Result<ServiceItem, CatalogError> {
        Ok(self.catalog.get_service(id).await?)
    }

    pub async fn get_service_by_code(&self, code: &str) -> Result<ServiceItem, CatalogError> {
        Ok(self.catalog.get_service_by_code(code).await?)
    }

    pub async fn list_services(&self, query: &ServiceQuery) -> Result<Vec<ServiceItem>, CatalogError> {
        Ok(self.catalog.find_services(query).await?)
    }

    #[instrument(skip(self, update))]
    pub async fn update_service(&self, id: ServiceId, update: ServiceUpdate) -> Result<ServiceItem, CatalogError> {
        let mut service = self.catalog.get_service(id).await?;
        service.apply_update(update, Utc::now())?;
        self.catalog.update_service(&service).await?;
        info!(service_code = %service.code, active = service.is_active, "service updated");
        Ok(service)
    }

    /// Marks a service inactive; it stays resolvable for existing bills
    #[instrument(skip(self))]
    pub async fn deactivate_service(&self, id: ServiceId) -> Result<ServiceItem, CatalogError> {
        let mut service = self.catalog.get_service(id).await?;
        service.deactivate(Utc::now());
        self.catalog.update_service(&service).await?;
        info!(service_code = %service.code, "service deactivated");
        Ok(service)
    }
}
