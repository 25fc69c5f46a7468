use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
    body::Body,
};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};

use shared_database::AppState;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Pull the bearer token out of the `Authorization` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    if !headers.contains_key(AUTHORIZATION) {
        return Err(AppError::Auth("No authentication token, access denied".to_string()));
    }

    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

// Validates the session credential and stores the caller in request extensions
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?;

    let user = validate_token(&token, &state.config.jwt_secret)
        .map_err(|e| {
            tracing::debug!("Rejected session credential: {}", e);
            AppError::Auth("Token is not valid".to_string())
        })?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

pub fn require_role(user: &User, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden(match role {
            Role::Doctor => "Access denied. Doctors only.".to_string(),
            Role::Patient => "Access denied. Patients only.".to_string(),
        }));
    }
    Ok(())
}

// Must be layered inside auth_middleware
pub async fn doctor_only(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    let user = extract_user(&request)?;
    require_role(&user, Role::Doctor)?;
    Ok(next.run(request).await)
}

// Must be layered inside auth_middleware
pub async fn patient_only(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    let user = extract_user(&request)?;
    require_role(&user, Role::Patient)?;
    Ok(next.run(request).await)
}
