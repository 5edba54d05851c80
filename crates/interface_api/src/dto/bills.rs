//! Bill DTOs

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_billing::{Bill, MedicineLine, PaymentMethod, PaymentStatus, PaymentUpdate, ServiceLine};

use super::nullable;

/// A new bill; `patientId`, `medicineId` and `serviceId` take a code or a UUID
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    #[validate(length(min = 1))]
    pub patient_id: String,
    pub consultation_fee: Option<Decimal>,
    #[serde(default)]
    #[validate(nested)]
    pub medicines: Vec<BillMedicineRequest>,
    #[serde(default)]
    pub services: Vec<BillServiceRequest>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BillMedicineRequest {
    pub medicine_id: String,
    #[validate(range(min = 1))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillServiceRequest {
    pub service_id: String,
}

/// Absent fields stay as they are; `null` clears the method or notes
///
/// The notes length is checked by the ledger.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_method: Option<Option<PaymentMethod>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl From<UpdatePaymentRequest> for PaymentUpdate {
    fn from(request: UpdatePaymentRequest) -> Self {
        PaymentUpdate {
            payment_status: request.payment_status,
            payment_method: request.payment_method,
            notes: request.notes,
        }
    }
}

/// `from` and `to` are whole days, both inclusive
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillListParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub patient: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillMedicineResponse {
    pub medicine_id: Uuid,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl From<MedicineLine> for BillMedicineResponse {
    fn from(line: MedicineLine) -> Self {
        BillMedicineResponse {
            medicine_id: *line.medicine.as_uuid(),
            name: line.name,
            price: line.price.amount(),
            quantity: line.quantity,
            total: line.total.amount(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillServiceResponse {
    pub service_id: Uuid,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl From<ServiceLine> for BillServiceResponse {
    fn from(line: ServiceLine) -> Self {
        BillServiceResponse {
            service_id: *line.service.as_uuid(),
            name: line.name,
            price: line.price.amount(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillResponse {
    pub id: Uuid,
    pub bill_id: String,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub consultation_fee: Decimal,
    pub medicines: Vec<BillMedicineResponse>,
    pub services: Vec<BillServiceResponse>,
    #[serde(with = "rust_decimal::serde::float")]
    pub medicines_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub services_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub currency: Currency,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Bill> for BillResponse {
    fn from(bill: Bill) -> Self {
        let currency = bill.currency();
        BillResponse {
            id: *bill.id.as_uuid(),
            bill_id: bill.code,
            patient_id: *bill.patient.as_uuid(),
            patient_name: bill.patient_name,
            patient_phone: bill.patient_phone,
            consultation_fee: bill.consultation_fee.amount(),
            medicines: bill.medicines.into_iter().map(Into::into).collect(),
            services: bill.services.into_iter().map(Into::into).collect(),
            medicines_total: bill.medicines_total.amount(),
            services_total: bill.services_total.amount(),
            total_amount: bill.total_amount.amount(),
            currency,
            payment_status: bill.payment_status,
            payment_method: bill.payment_method,
            notes: bill.notes,
            created_at: bill.created_at,
            updated_at: bill.updated_at,
        }
    }
}
