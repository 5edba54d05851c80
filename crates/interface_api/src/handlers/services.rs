//! Clinic service handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use core_kernel::SequenceKind;
use domain_catalog::ServiceQuery;

use super::{parse_key, resolve_service, RecordKey};
use crate::dto::services::*;
use crate::{error::ApiError, AppState};

pub async fn create_service(
    State(state): State<AppState>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceResponse>), ApiError> {
    request.validate()?;
    let details = request.into_details(state.config.currency)?;
    let service = state.catalog.create_service(details).await?;
    Ok((StatusCode::CREATED, Json(service.into())))
}

/// Lists active services unless `includeInactive=true`
pub async fn list_services(
    State(state): State<AppState>,
    Query(params): Query<ServiceListParams>,
) -> Result<Json<Vec<ServiceResponse>>, ApiError> {
    let query = ServiceQuery::from(params);
    let services = state.catalog.list_services(&query).await?;
    Ok(Json(services.into_iter().map(Into::into).collect()))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServiceResponse>, ApiError> {
    let service = match parse_key(SequenceKind::Service, &id)? {
        RecordKey::Id(id) => state.catalog.get_service(id).await?,
        RecordKey::Code(code) => state.catalog.get_service_by_code(&code).await?,
    };
    Ok(Json(service.into()))
}

pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<ServiceResponse>, ApiError> {
    request.validate()?;
    let id = resolve_service(&state, &id).await?;
    let update = request.into_update(state.config.currency)?;
    let service = state.catalog.update_service(id, update).await?;
    Ok(Json(service.into()))
}

/// Soft delete: the service stays on old bills but cannot be billed again
pub async fn deactivate_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServiceResponse>, ApiError> {
    let id = resolve_service(&state, &id).await?;
    let service = state.catalog.deactivate_service(id).await?;
    Ok(Json(service.into()))
}
