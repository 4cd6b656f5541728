// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::AppError,
    state::AppState,
    utils::jwt::{ADMIN_ROLE, sign_jwt},
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Authenticates the admin and returns a JWT token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !state.admin.verify(payload.username.trim(), &payload.password)? {
        tracing::warn!("Rejected admin login for '{}'", payload.username);
        return Err(AppError::AuthError(
            "Invalid username or password".to_string(),
        ));
    }

    let token = sign_jwt(
        state.admin.username(),
        ADMIN_ROLE,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    tracing::info!("Admin '{}' logged in", state.admin.username());

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "expires_in": state.config.jwt_expiration
    })))
}
