use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;

use shared_config::AppConfig;
use shared_database::AppState;
use shared_models::auth::{JwtClaims, Role, User};

use crate::jwt::sign_claims;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub upload_dir: PathBuf,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            upload_dir: std::env::temp_dir().join("medconnect-test-uploads"),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            port: 0,
            upload_dir: self.upload_dir.clone(),
            meeting_base_url: "https://meet.jit.si".to_string(),
            frontend_url: None,
            seed_demo_data: false,
        }
    }

    pub fn to_state(&self) -> Arc<AppState> {
        Arc::new(AppState::new(self.to_app_config()))
    }
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub doctor_id: Option<i64>,
}

impl TestUser {
    pub fn new(id: i64, email: &str, role: Role) -> Self {
        Self {
            id,
            email: email.to_string(),
            role,
            doctor_id: None,
        }
    }

    pub fn doctor(id: i64, doctor_id: i64, email: &str) -> Self {
        Self {
            doctor_id: Some(doctor_id),
            ..Self::new(id, email, Role::Doctor)
        }
    }

    pub fn patient(id: i64, email: &str) -> Self {
        Self::new(id, email, Role::Patient)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            doctor_id: self.doctor_id,
            issued_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let claims = JwtClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            doctor_id: user.doctor_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        sign_claims(&claims, secret).expect("test secret must not be empty")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Row shapes as PostgREST returns them for the clinic schema.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_row(user_id: i64, email: &str, role: &str, password_hash: &str) -> serde_json::Value {
        json!({
            "user_id": user_id,
            "name": "Test User",
            "email": email,
            "password": password_hash,
            "role": role,
            "phone": "5550100",
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_row(doctor_id: i64, user_id: i64) -> serde_json::Value {
        json!({
            "doctor_id": doctor_id,
            "user_id": user_id,
            "specialization": "Cardiologist",
            "qualification": "MBBS, MD (Cardiology)",
            "experience": 10,
            "availability": "Mon-Fri: 9AM-5PM",
            "consultation_fee": 500.0,
            "rating": 4.8,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn directory_row(doctor_id: i64, user_id: i64, rating: f64) -> serde_json::Value {
        json!({
            "doctor_id": doctor_id,
            "user_id": user_id,
            "specialization": "Cardiologist",
            "qualification": "MBBS, MD (Cardiology)",
            "experience": 10,
            "availability": "Mon-Fri: 9AM-5PM",
            "consultation_fee": 500.0,
            "rating": rating,
            "name": "Dr. Sarah Johnson",
            "email": "doctor@healthcare.com",
            "phone": "9876543210"
        })
    }

    pub fn appointment_row(
        appointment_id: i64,
        patient_id: i64,
        doctor_id: i64,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "appointment_id": appointment_id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "appointment_date": "2030-05-01",
            "appointment_time": "10:00:00",
            "status": status,
            "video_link": format!("https://meet.jit.si/medconnect-test-{}", appointment_id),
            "notes": "",
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn prescription_row(prescription_id: i64, appointment_id: i64, stored_name: &str) -> serde_json::Value {
        json!({
            "prescription_id": prescription_id,
            "appointment_id": appointment_id,
            "file_path": format!("/uploads/{}", stored_name),
            "file_name": "rx.pdf",
            "uploaded_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(code: &str, message: &str) -> serde_json::Value {
        json!({
            "code": code,
            "details": null,
            "hint": null,
            "message": message
        })
    }

    pub fn unique_violation(constraint: &str) -> serde_json::Value {
        Self::error_response(
            "23505",
            &format!("duplicate key value violates unique constraint \"{}\"", constraint),
        )
    }
}
