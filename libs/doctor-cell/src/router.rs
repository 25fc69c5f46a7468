use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
    middleware,
};

use shared_database::AppState;
use shared_utils::extractor::{auth_middleware, doctor_only};

use crate::handlers;

pub fn doctor_routes(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor));

    // Layers run outermost-last: authenticate, then check the role
    let protected_routes = Router::new()
        .route("/profile", put(handlers::update_profile))
        .layer(middleware::from_fn(doctor_only))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
