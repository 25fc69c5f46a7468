use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
    middleware,
};

use shared_config::MAX_UPLOAD_BYTES;
use shared_database::AppState;
use shared_utils::extractor::{auth_middleware, doctor_only};

use crate::handlers;

/// Request body ceiling for uploads. Files between the file limit and this
/// are refused by the service as too large.
pub const UPLOAD_BODY_LIMIT: usize = 2 * MAX_UPLOAD_BYTES;

pub fn prescription_routes(state: Arc<AppState>) -> Router {
    let doctor_routes = Router::new()
        .route("/upload", post(handlers::upload_prescription))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .layer(middleware::from_fn(doctor_only))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let protected_routes = Router::new()
        .route("/{appointment_id}", get(handlers::get_prescriptions))
        .route("/download/{prescription_id}", get(handlers::download_prescription))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(doctor_routes)
        .merge(protected_routes)
        .with_state(state)
}
