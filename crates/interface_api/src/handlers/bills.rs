//! Bill handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use validator::Validate;

use core_kernel::SequenceKind;
use domain_billing::{BillQuery, CreateInvoiceRequest, MedicineLineRequest};

use super::{parse_key, resolve_bill, resolve_medicine, resolve_patient, resolve_service, RecordKey};
use crate::dto::bills::*;
use crate::dto::{Page, Paginated};
use crate::{error::ApiError, AppState};

/// Issues a bill: stock is withdrawn and the bill stored together, or not at all
pub async fn create_bill(
    State(state): State<AppState>,
    Json(request): Json<CreateBillRequest>,
) -> Result<(StatusCode, Json<BillResponse>), ApiError> {
    request.validate()?;

    let patient = resolve_patient(&state, &request.patient_id).await?;
    let mut medicines = Vec::with_capacity(request.medicines.len());
    for line in &request.medicines {
        medicines.push(MedicineLineRequest {
            medicine: resolve_medicine(&state, &line.medicine_id).await?,
            quantity: line.quantity,
        });
    }
    let mut services = Vec::with_capacity(request.services.len());
    for line in &request.services {
        services.push(resolve_service(&state, &line.service_id).await?);
    }

    let bill = state
        .ledger
        .create_invoice(CreateInvoiceRequest {
            patient,
            consultation_fee: request.consultation_fee,
            medicines,
            services,
            payment_status: request.payment_status,
            payment_method: request.payment_method,
            notes: request.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(bill.into())))
}

/// Lists bills newest first
pub async fn list_bills(
    State(state): State<AppState>,
    Query(params): Query<BillListParams>,
) -> Result<Json<Paginated<BillResponse>>, ApiError> {
    let page = Page::from_params(params.page, params.limit);
    let patient = match params.patient.as_deref() {
        Some(raw) => Some(resolve_patient(&state, raw).await?),
        None => None,
    };
    let query = BillQuery {
        from: params.from.map(start_of_day),
        to: params.to.map(end_of_day).transpose()?,
        patient,
        payment_status: params.payment_status,
        search: params.search,
        ..BillQuery::default()
    }
    .paginate(page.limit, page.offset());

    let (bills, total) = state.ledger.list_invoices(&query).await?;
    Ok(Json(page.wrap(bills.into_iter().map(Into::into).collect(), total)))
}

pub async fn get_bill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BillResponse>, ApiError> {
    let bill = match parse_key(SequenceKind::Bill, &id)? {
        RecordKey::Id(id) => state.ledger.get_invoice(id).await?,
        RecordKey::Code(code) => state.ledger.get_invoice_by_code(&code).await?,
    };
    Ok(Json(bill.into()))
}

/// Changes payment status, method or notes; amounts never change
pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<Json<BillResponse>, ApiError> {
    let id = resolve_bill(&state, &id).await?;
    let bill = state.ledger.update_invoice_payment(id, request.into()).await?;
    Ok(Json(bill.into()))
}

/// Deletes a bill and puts its medicines back on the shelf
pub async fn delete_bill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = resolve_bill(&state, &id).await?;
    state.ledger.delete_invoice(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Exclusive upper bound covering all of `date`
fn end_of_day(date: NaiveDate) -> Result<DateTime<Utc>, ApiError> {
    date.checked_add_days(Days::new(1))
        .map(start_of_day)
        .ok_or_else(|| ApiError::BadRequest(format!("date {date} is out of range")))
}
