use std::sync::Arc;

use axum::{
    Json, Router,
    routing::get,
};
use serde_json::{json, Value};
use tower_http::services::ServeDir;

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use doctor_cell::router::doctor_routes;
use prescription_cell::router::prescription_routes;
use shared_database::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/prescriptions", prescription_routes(state.clone()));

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "message": "Server is running" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;
    use wiremock::{MockServer, Mock, ResponseTemplate};
    use wiremock::matchers::{method, path, query_param};

    use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(TestConfig::default().to_state());
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "OK");
    }

    #[tokio::test]
    async fn test_cells_mounted_under_api() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/doctor_directory"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                MockSupabaseResponses::directory_row(1, 1, 4.8)
            ])))
            .mount(&mock_server)
            .await;

        let app = create_router(TestConfig::with_supabase_url(mock_server.uri()).to_state());

        let response = app.clone()
            .oneshot(Request::builder().uri("/api/doctors").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["doctors"][0]["doctor_id"], 1);

        let response = app
            .oneshot(Request::builder().uri("/api/appointments/patient").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_registered_doctor_profile_matches_directory() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .and(query_param("select", "user_id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/register_account"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user_id": 7, "name": "Dr. Priya Nair", "email": "priya@x.com",
                "role": "doctor", "phone": null, "doctor_id": 5
            })))
            .mount(&mock_server)
            .await;

        let app = create_router(TestConfig::with_supabase_url(mock_server.uri()).to_state());

        // Shape posted by the signup form: every input, numbers as strings.
        let response = app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({
                        "name": "Dr. Priya Nair",
                        "email": "priya@x.com",
                        "password": "doctor123",
                        "phone": "",
                        "role": "doctor",
                        "specialization": "Dermatologist",
                        "qualification": "MD",
                        "experience": "12",
                        "consultationFee": "650"
                    }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let doctor_id = body_json(response).await["user"]["doctor_id"].as_i64().unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let rpc = requests.iter().find(|r| r.url.path() == "/rest/v1/rpc/register_account").unwrap();
        let stored: Value = serde_json::from_slice(&rpc.body).unwrap();
        assert_eq!(stored["p_specialization"], "Dermatologist");
        assert_eq!(stored["p_qualification"], "MD");
        assert_eq!(stored["p_experience"], 12);
        assert_eq!(stored["p_consultation_fee"], 650.0);

        // The directory serves back what the registration stored.
        Mock::given(method("GET"))
            .and(path("/rest/v1/doctor_directory"))
            .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "doctor_id": doctor_id,
                "user_id": 7,
                "specialization": stored["p_specialization"],
                "qualification": stored["p_qualification"],
                "experience": stored["p_experience"],
                "availability": "",
                "consultation_fee": stored["p_consultation_fee"],
                "rating": 0.0,
                "name": "Dr. Priya Nair",
                "email": "priya@x.com",
                "phone": null
            }])))
            .mount(&mock_server)
            .await;

        let response = app
            .oneshot(Request::builder().uri(format!("/api/doctors/{}", doctor_id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let doctor = &body_json(response).await["doctor"];
        assert_eq!(doctor["specialization"], "Dermatologist");
        assert_eq!(doctor["qualification"], "MD");
        assert_eq!(doctor["experience"], 12);
        assert_eq!(doctor["consultation_fee"], 650.0);
    }

    #[tokio::test]
    async fn test_uploads_served_statically() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("prescription-1-1.pdf"), b"%PDF").unwrap();

        let mut config = TestConfig::default();
        config.upload_dir = dir.path().to_path_buf();
        let app = create_router(config.to_state());

        let response = app
            .oneshot(Request::builder().uri("/uploads/prescription-1-1.pdf").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF");
    }
}
