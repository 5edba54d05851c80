//! Login handler

use axum::{extract::State, Json};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::{login as issue_token, AuthError};
use crate::dto::auth::{LoginRequest, LoginResponse};
use crate::{error::ApiError, AppState};

/// Exchanges operator credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;
    match issue_token(&state.config, &request.username, &request.password) {
        Ok(token) => {
            info!(user = %request.username, "operator logged in");
            Ok(Json(LoginResponse {
                token,
                token_type: "Bearer",
                expires_in: state.config.jwt_expiration_secs,
            }))
        }
        Err(AuthError::InvalidCredentials) => {
            warn!(user = %request.username, "login rejected");
            Err(AuthError::InvalidCredentials.into())
        }
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}
