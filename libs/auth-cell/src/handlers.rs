use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::request::Json;

use crate::models::{LoginRequest, RegisterRequest};
use crate::services::credential::CredentialService;

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = CredentialService::new(&state);
    let response = service.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful",
            "token": response.token,
            "user": response.user
        })),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = CredentialService::new(&state);
    let response = service.login(request).await?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": response.token,
        "user": response.user
    })))
}

#[axum::debug_handler]
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    debug!("Getting profile for user: {}", user.id);

    let service = CredentialService::new(&state);
    let profile = service.get_current_user(&user).await?;

    Ok(Json(json!({ "user": profile })))
}
