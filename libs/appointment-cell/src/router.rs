use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
    middleware,
};

use shared_database::AppState;
use shared_utils::extractor::{auth_middleware, doctor_only, patient_only};

use crate::handlers;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    let patient_routes = Router::new()
        .route("/book", post(handlers::book_appointment))
        .route("/patient", get(handlers::get_patient_appointments))
        .route("/{appointment_id}/cancel", delete(handlers::cancel_appointment))
        .layer(middleware::from_fn(patient_only))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let doctor_routes = Router::new()
        .route("/doctor", get(handlers::get_doctor_appointments))
        .layer(middleware::from_fn(doctor_only))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Ownership for these is checked per appointment
    let party_routes = Router::new()
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/status", put(handlers::update_status))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(patient_routes)
        .merge(doctor_routes)
        .merge(party_routes)
        .with_state(state)
}
