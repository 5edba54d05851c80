//! Clinic service DTOs

use chrono::{DateTime, Utc};
use core_kernel::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::price;
use crate::error::ApiError;
use domain_catalog::{ServiceDetails, ServiceItem, ServiceQuery, ServiceUpdate};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub price: Decimal,
    pub duration: Option<String>,
}

impl CreateServiceRequest {
    pub fn into_details(self, currency: Currency) -> Result<ServiceDetails, ApiError> {
        Ok(ServiceDetails {
            name: self.name,
            description: self.description,
            category: self.category,
            price: price("price", self.price, currency)?,
            duration: self.duration,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub duration: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateServiceRequest {
    pub fn into_update(self, currency: Currency) -> Result<ServiceUpdate, ApiError> {
        Ok(ServiceUpdate {
            name: self.name,
            description: self.description,
            category: self.category,
            price: self.price.map(|amount| price("price", amount, currency)).transpose()?,
            duration: self.duration,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListParams {
    #[serde(default)]
    pub include_inactive: bool,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl From<ServiceListParams> for ServiceQuery {
    fn from(params: ServiceListParams) -> Self {
        ServiceQuery {
            include_inactive: params.include_inactive,
            category: params.category,
            search: params.search,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub id: Uuid,
    pub service_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: Currency,
    pub duration: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServiceItem> for ServiceResponse {
    fn from(service: ServiceItem) -> Self {
        ServiceResponse {
            id: *service.id.as_uuid(),
            service_id: service.code,
            name: service.name,
            description: service.description,
            category: service.category,
            price: service.price.amount(),
            currency: service.price.currency(),
            duration: service.duration,
            is_active: service.is_active,
            created_at: service.created_at,
            updated_at: service.updated_at,
        }
    }
}
