//! Identifier handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use core_kernel::{SequenceKind, SequentialCode};

use crate::{error::ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct IdentifierResponse {
    pub kind: SequenceKind,
    pub code: String,
}

/// Reserves the next code of a kind (`patient`, `medicine`, `service`, `bill`
/// or a prefix such as `BILL`); a reserved code is never handed out again
pub async fn next_identifier(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<IdentifierResponse>, ApiError> {
    let kind = SequenceKind::parse(&kind)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown identifier kind '{kind}'")))?;
    let code: SequentialCode = state.ledger.next_identifier(kind).await?;
    Ok(Json(IdentifierResponse {
        kind,
        code: code.to_string(),
    }))
}
