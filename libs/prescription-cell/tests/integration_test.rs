use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, query_param, body_partial_json};

use prescription_cell::router::prescription_routes;
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils, MockSupabaseResponses};

const BOUNDARY: &str = "medconnect-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File { name: &'a str, file_name: &'a str, content_type: &'a str, bytes: Vec<u8> },
}

fn multipart_body(parts: Vec<Part<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", name, value).as_bytes(),
                );
            }
            Part::File { name, file_name, content_type, bytes } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn pdf_part(bytes: Vec<u8>) -> Part<'static> {
    Part::File { name: "prescription", file_name: "rx.pdf", content_type: "application/pdf", bytes }
}

struct TestApp {
    server: MockServer,
    config: TestConfig,
    uploads: TempDir,
}

impl TestApp {
    async fn start() -> Self {
        let server = MockServer::start().await;
        let uploads = TempDir::new().unwrap();
        let mut config = TestConfig::with_supabase_url(server.uri());
        config.upload_dir = uploads.path().to_path_buf();
        Self { server, config, uploads }
    }

    fn router(&self) -> Router {
        prescription_routes(self.config.to_state())
    }

    fn doctor_token(&self) -> String {
        JwtTestUtils::create_test_token(&TestUser::doctor(3, 2, "doctor@x.com"), &self.config.jwt_secret, None)
    }

    fn patient_token(&self) -> String {
        JwtTestUtils::create_test_token(&TestUser::patient(10, "patient@x.com"), &self.config.jwt_secret, None)
    }

    async fn upload(&self, token: &str, parts: Vec<Part<'_>>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(multipart_body(parts)))
            .unwrap();

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn get(&self, uri: &str, token: &str) -> axum::response::Response {
        let request = Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        self.router().oneshot(request).await.unwrap()
    }

    fn stored_files(&self) -> Vec<String> {
        std::fs::read_dir(self.uploads.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

// ==============================================================================
// UPLOAD
// ==============================================================================

#[tokio::test]
async fn test_upload_prescription() {
    let app = TestApp::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/record_prescription"))
        .and(body_partial_json(json!({
            "p_appointment_id": 1,
            "p_doctor_id": 2,
            "p_file_name": "rx.pdf"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockSupabaseResponses::prescription_row(5, 1, "prescription-1-1.pdf"),
        ))
        .expect(1)
        .mount(&app.server)
        .await;

    let token = app.doctor_token();
    let (status, body) = app
        .upload(&token, vec![Part::Text("appointment_id", "1"), pdf_part(b"%PDF-1.4 test".to_vec())])
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Prescription uploaded successfully");
    assert_eq!(body["prescription"]["prescription_id"], 5);

    let files = app.stored_files();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("prescription-"));
    assert!(files[0].ends_with(".pdf"));
    assert_eq!(std::fs::read(app.uploads.path().join(&files[0])).unwrap(), b"%PDF-1.4 test");

    let requests = app.server.received_requests().await.unwrap();
    let args: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(args["p_file_path"], format!("/uploads/{}", files[0]));
}

#[tokio::test]
async fn test_upload_then_list() {
    let app = TestApp::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/record_prescription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockSupabaseResponses::prescription_row(5, 1, "prescription-1-1.pdf"),
        ))
        .mount(&app.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/prescriptions"))
        .and(query_param("appointment_id", "eq.1"))
        .and(query_param("order", "uploaded_at.desc,prescription_id.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::prescription_row(5, 1, "prescription-1-1.pdf")
        ])))
        .mount(&app.server)
        .await;

    let token = app.doctor_token();
    let (status, _) = app
        .upload(&token, vec![Part::Text("appointment_id", "1"), pdf_part(b"%PDF".to_vec())])
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let response = app.get("/1", &app.patient_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["prescriptions"][0]["prescription_id"], 5);
    assert_eq!(body["prescriptions"][0]["file_name"], "rx.pdf");
}

#[tokio::test]
async fn test_upload_too_large_is_rejected() {
    let app = TestApp::start().await;
    let token = app.doctor_token();

    let six_mib = vec![0u8; 6 * 1024 * 1024];
    let (status, body) = app
        .upload(&token, vec![Part::Text("appointment_id", "1"), pdf_part(six_mib)])
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File too large. Maximum size is 5 MB");
    assert!(app.server.received_requests().await.unwrap().is_empty());
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_unsupported_type() {
    let app = TestApp::start().await;
    let token = app.doctor_token();

    let (status, body) = app
        .upload(
            &token,
            vec![
                Part::Text("appointment_id", "1"),
                Part::File {
                    name: "prescription",
                    file_name: "notes.txt",
                    content_type: "text/plain",
                    bytes: b"hello".to_vec(),
                },
            ],
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only PDF and image files are allowed");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_without_file() {
    let app = TestApp::start().await;
    let token = app.doctor_token();

    let (status, body) = app.upload(&token, vec![Part::Text("appointment_id", "1")]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please upload a file");
}

#[tokio::test]
async fn test_upload_without_appointment_id() {
    let app = TestApp::start().await;
    let token = app.doctor_token();

    let (status, body) = app.upload(&token, vec![pdf_part(b"%PDF".to_vec())]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Appointment ID is required");
}

#[tokio::test]
async fn test_upload_requires_multipart_body() {
    let app = TestApp::start().await;
    let token = app.doctor_token();

    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"appointment_id": 1}"#))
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(app.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_patient_cannot_upload() {
    let app = TestApp::start().await;
    let token = app.patient_token();

    let (status, _) = app
        .upload(&token, vec![Part::Text("appointment_id", "1"), pdf_part(b"%PDF".to_vec())])
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_for_foreign_appointment_removes_file() {
    let app = TestApp::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/record_prescription"))
        .respond_with(ResponseTemplate::new(400).set_body_json(
            MockSupabaseResponses::error_response("HC404", "Appointment not found"),
        ))
        .mount(&app.server)
        .await;

    let token = app.doctor_token();
    let (status, body) = app
        .upload(&token, vec![Part::Text("appointment_id", "9"), pdf_part(b"%PDF".to_vec())])
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Appointment not found");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_for_cancelled_appointment() {
    let app = TestApp::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/record_prescription"))
        .respond_with(ResponseTemplate::new(400).set_body_json(
            MockSupabaseResponses::error_response("HC409", "Appointment is cancelled"),
        ))
        .mount(&app.server)
        .await;

    let token = app.doctor_token();
    let (status, body) = app
        .upload(&token, vec![Part::Text("appointment_id", "1"), pdf_part(b"%PDF".to_vec())])
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot attach a prescription to a cancelled appointment");
    assert!(app.stored_files().is_empty());
}

// ==============================================================================
// DOWNLOAD
// ==============================================================================

#[tokio::test]
async fn test_download_prescription() {
    let app = TestApp::start().await;
    std::fs::write(app.uploads.path().join("prescription-1-1.pdf"), b"%PDF-1.4 body").unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/prescriptions"))
        .and(query_param("prescription_id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::prescription_row(5, 1, "prescription-1-1.pdf")
        ])))
        .mount(&app.server)
        .await;

    let response = app.get("/download/5", &app.patient_token()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    assert_eq!(response.headers()["content-disposition"], "attachment; filename=\"rx.pdf\"");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"%PDF-1.4 body");
}

#[tokio::test]
async fn test_download_unknown_prescription() {
    let app = TestApp::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/prescriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.server)
        .await;

    let response = app.get("/download/5", &app.doctor_token()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_missing_file() {
    let app = TestApp::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/prescriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::prescription_row(5, 1, "prescription-gone.pdf")
        ])))
        .mount(&app.server)
        .await;

    let response = app.get("/download/5", &app.doctor_token()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "File not found");
}

#[tokio::test]
async fn test_listing_requires_token() {
    let app = TestApp::start().await;
    let response = app
        .router()
        .oneshot(Request::builder().uri("/1").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
