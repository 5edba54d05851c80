//! Medicine DTOs

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::price;
use crate::error::ApiError;
use domain_inventory::{Medicine, MedicineDetails, MedicineStatus, MedicineUpdate, StockAlerts, StockOperation};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicineRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub generic_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub manufacturer: Option<String>,
    pub batch_number: Option<String>,
    pub description: Option<String>,
    pub buying_price: Decimal,
    pub selling_price: Decimal,
    pub stock: u32,
    pub min_stock_level: Option<u32>,
    pub expiry_date: NaiveDate,
}

impl CreateMedicineRequest {
    pub fn into_details(self, currency: Currency) -> Result<MedicineDetails, ApiError> {
        Ok(MedicineDetails {
            name: self.name,
            generic_name: self.generic_name,
            category: self.category,
            manufacturer: self.manufacturer,
            batch_number: self.batch_number,
            description: self.description,
            buying_price: price("buyingPrice", self.buying_price, currency)?,
            selling_price: price("sellingPrice", self.selling_price, currency)?,
            stock: self.stock,
            min_stock_level: self.min_stock_level,
            expiry_date: self.expiry_date,
        })
    }
}

/// Stock is changed only through `PATCH /medicines/:id/stock`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedicineRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub generic_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub batch_number: Option<String>,
    pub description: Option<String>,
    pub buying_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub min_stock_level: Option<u32>,
    pub expiry_date: Option<NaiveDate>,
}

impl UpdateMedicineRequest {
    pub fn into_update(self, currency: Currency) -> Result<MedicineUpdate, ApiError> {
        Ok(MedicineUpdate {
            name: self.name,
            generic_name: self.generic_name,
            category: self.category,
            manufacturer: self.manufacturer,
            batch_number: self.batch_number,
            description: self.description,
            buying_price: self
                .buying_price
                .map(|amount| price("buyingPrice", amount, currency))
                .transpose()?,
            selling_price: self
                .selling_price
                .map(|amount| price("sellingPrice", amount, currency))
                .transpose()?,
            min_stock_level: self.min_stock_level,
            expiry_date: self.expiry_date,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustmentRequest {
    pub quantity: u32,
    pub operation: StockOperation,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<MedicineStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineResponse {
    pub id: Uuid,
    pub medicine_id: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub category: String,
    pub manufacturer: Option<String>,
    pub batch_number: Option<String>,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub buying_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub selling_price: Decimal,
    pub currency: Currency,
    pub stock: u32,
    pub min_stock_level: u32,
    pub expiry_date: NaiveDate,
    pub status: MedicineStatus,
    /// Percentage of the buying price
    #[serde(with = "rust_decimal::serde::float")]
    pub profit_margin: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Medicine> for MedicineResponse {
    fn from(medicine: Medicine) -> Self {
        let profit_margin = medicine.profit_margin();
        MedicineResponse {
            id: *medicine.id.as_uuid(),
            medicine_id: medicine.code,
            name: medicine.name,
            generic_name: medicine.generic_name,
            category: medicine.category,
            manufacturer: medicine.manufacturer,
            batch_number: medicine.batch_number,
            description: medicine.description,
            buying_price: medicine.buying_price.amount(),
            selling_price: medicine.selling_price.amount(),
            currency: medicine.selling_price.currency(),
            stock: medicine.stock,
            min_stock_level: medicine.min_stock_level,
            expiry_date: medicine.expiry_date,
            status: medicine.status,
            profit_margin,
            created_at: medicine.created_at,
            updated_at: medicine.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAlertsResponse {
    pub low_stock: Vec<MedicineResponse>,
    pub out_of_stock: Vec<MedicineResponse>,
    pub expiring_soon: Vec<MedicineResponse>,
    pub total: usize,
}

impl From<StockAlerts> for StockAlertsResponse {
    fn from(alerts: StockAlerts) -> Self {
        let total = alerts.low_stock.len() + alerts.out_of_stock.len() + alerts.expiring_soon.len();
        StockAlertsResponse {
            low_stock: alerts.low_stock.into_iter().map(Into::into).collect(),
            out_of_stock: alerts.out_of_stock.into_iter().map(Into::into).collect(),
            expiring_soon: alerts.expiring_soon.into_iter().map(Into::into).collect(),
            total,
        }
    }
}
