//! Medicine handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use core_kernel::SequenceKind;
use domain_inventory::MedicineQuery;

use super::{parse_key, resolve_medicine, RecordKey};
use crate::dto::medicines::*;
use crate::dto::{Page, Paginated};
use crate::{error::ApiError, AppState};

/// Adds a medicine under the next `MED` code, priced in the configured currency
pub async fn create_medicine(
    State(state): State<AppState>,
    Json(request): Json<CreateMedicineRequest>,
) -> Result<(StatusCode, Json<MedicineResponse>), ApiError> {
    request.validate()?;
    let details = request.into_details(state.config.currency)?;
    let medicine = state.inventory.create_medicine(details).await?;
    Ok((StatusCode::CREATED, Json(medicine.into())))
}

/// Lists medicines by name
pub async fn list_medicines(
    State(state): State<AppState>,
    Query(params): Query<MedicineListParams>,
) -> Result<Json<Paginated<MedicineResponse>>, ApiError> {
    let page = Page::from_params(params.page, params.limit);
    let query = MedicineQuery {
        search: params.search,
        category: params.category,
        status: params.status,
        ..MedicineQuery::default()
    }
    .paginate(page.limit, page.offset());

    let (medicines, total) = state.inventory.list_medicines(&query).await?;
    Ok(Json(page.wrap(medicines.into_iter().map(Into::into).collect(), total)))
}

pub async fn get_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MedicineResponse>, ApiError> {
    let medicine = match parse_key(SequenceKind::Medicine, &id)? {
        RecordKey::Id(id) => state.inventory.get_medicine(id).await?,
        RecordKey::Code(code) => state.inventory.get_medicine_by_code(&code).await?,
    };
    Ok(Json(medicine.into()))
}

pub async fn update_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMedicineRequest>,
) -> Result<Json<MedicineResponse>, ApiError> {
    request.validate()?;
    let id = resolve_medicine(&state, &id).await?;
    let update = request.into_update(state.config.currency)?;
    let medicine = state.inventory.update_medicine(id, update).await?;
    Ok(Json(medicine.into()))
}

/// Sets, adds to or subtracts from the shelf count
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StockAdjustmentRequest>,
) -> Result<Json<MedicineResponse>, ApiError> {
    let id = resolve_medicine(&state, &id).await?;
    let medicine = state
        .inventory
        .adjust_stock(id, request.quantity, request.operation)
        .await?;
    Ok(Json(medicine.into()))
}

pub async fn delete_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = resolve_medicine(&state, &id).await?;
    state.inventory.delete_medicine(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Medicines that are low, out of stock or close to expiry
pub async fn stock_alerts(State(state): State<AppState>) -> Result<Json<StockAlertsResponse>, ApiError> {
    let alerts = state.inventory.stock_alerts().await?;
    Ok(Json(alerts.into()))
}
