//! Patient handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use domain_patient::PatientQuery;

use super::{parse_key, resolve_patient, RecordKey};
use crate::dto::patients::*;
use crate::dto::{Page, Paginated};
use crate::{error::ApiError, AppState};
use core_kernel::SequenceKind;

/// Registers a patient under the next `DOC` code
pub async fn create_patient(
    State(state): State<AppState>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<PatientResponse>), ApiError> {
    request.validate()?;
    let patient = state.patients.create_patient(request.into()).await?;
    Ok((StatusCode::CREATED, Json(patient.into())))
}

/// Lists patients, newest first
pub async fn list_patients(
    State(state): State<AppState>,
    Query(params): Query<PatientListParams>,
) -> Result<Json<Paginated<PatientResponse>>, ApiError> {
    let page = Page::from_params(params.page, params.limit);
    let query = PatientQuery {
        search: params.search,
        status: params.status,
        ..PatientQuery::default()
    }
    .paginate(page.limit, page.offset());

    let (patients, total) = state.patients.list_patients(&query).await?;
    Ok(Json(page.wrap(patients.into_iter().map(Into::into).collect(), total)))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PatientResponse>, ApiError> {
    let patient = match parse_key(SequenceKind::Patient, &id)? {
        RecordKey::Id(id) => state.patients.get_patient(id).await?,
        RecordKey::Code(code) => state.patients.get_patient_by_code(&code).await?,
    };
    Ok(Json(patient.into()))
}

pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<PatientResponse>, ApiError> {
    request.validate()?;
    let id = resolve_patient(&state, &id).await?;
    let patient = state.patients.update_patient(id, request.into()).await?;
    Ok(Json(patient.into()))
}

/// Appends a visit and moves `lastVisit` forward
pub async fn record_visit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RecordVisitRequest>,
) -> Result<(StatusCode, Json<PatientResponse>), ApiError> {
    request.validate()?;
    let id = resolve_patient(&state, &id).await?;
    let patient = state.patients.record_visit(id, request.into()).await?;
    Ok((StatusCode::CREATED, Json(patient.into())))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = resolve_patient(&state, &id).await?;
    state.patients.delete_patient(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
