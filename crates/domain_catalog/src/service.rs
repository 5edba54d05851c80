//! Catalog service item

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, SequentialCode, ServiceId};

use crate::error::CatalogError;

#[derive(Debug, Clone)]
pub struct ServiceDetails {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Money,
    /// Free-form label such as "30 mins"
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Money>,
    pub duration: Option<String>,
    pub is_active: Option<bool>,
}

/// A billable service offered by the clinic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceItem {
    pub id: ServiceId,
    /// Sequential `SER` code, assigned once
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Money,
    pub duration: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceItem {
    pub fn new(code: SequentialCode, details: ServiceDetails, now: DateTime<Utc>) -> Result<Self, CatalogError> {
        require("name", &details.name)?;
        require("category", &details.category)?;
        validate_price(&details.price)?;

        Ok(Self {
            id: ServiceId::new_v7(),
            code: code.to_string(),
            name: details.name.trim().to_string(),
            description: details.description,
            category: details.category.trim().to_string(),
            price: details.price,
            duration: details.duration,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: ServiceUpdate, now: DateTime<Utc>) -> Result<(), CatalogError> {
        if let Some(name) = &update.name {
            require("name", name)?;
        }
        if let Some(category) = &update.category {
            require("category", category)?;
        }
        if let Some(price) = &update.price {
            validate_price(price)?;
        }

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if update.description.is_some() {
            self.description = update.description;
        }
        if let Some(category) = update.category {
            self.category = category.trim().to_string();
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if update.duration.is_some() {
            self.duration = update.duration;
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Soft delete
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = now;
    }

    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.code.to_lowercase().contains(&needle)
    }
}

fn require(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn validate_price(price: &Money) -> Result<(), CatalogError> {
    if price.is_negative() {
        return Err(CatalogError::validation("price must not be negative"));
    }
    price
        .within_limit()
        .map_err(|e| CatalogError::validation(format!("price {e}")))?;
    Ok(())
}
