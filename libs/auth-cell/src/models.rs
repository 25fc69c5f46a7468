use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DbError;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_utils::request::number_or_blank;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Registration payload. Doctor-only fields are ignored for patients. Numeric
/// fields accept form strings, and blanks count as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub qualification: Option<String>,
    #[serde(default, deserialize_with = "number_or_blank::deserialize")]
    pub experience: Option<i32>,
    pub availability: Option<String>,
    #[serde(alias = "consultationFee", default, deserialize_with = "number_or_blank::deserialize")]
    pub consultation_fee: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

// ==============================================================================
// STORED / PUBLIC MODELS
// ==============================================================================

/// Full `users` row. Holds the password verifier and never leaves the cell.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of the `register_account` database function.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredAccount {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub doctor_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<i64>,
}

impl From<RegisteredAccount> for PublicUser {
    fn from(account: RegisteredAccount) -> Self {
        Self {
            user_id: account.user_id,
            name: account.name,
            email: account.email,
            role: account.role,
            phone: account.phone,
            doctor_id: account.doctor_id,
        }
    }
}

impl UserRecord {
    pub fn into_public(self, doctor_id: Option<i64>) -> PublicUser {
        PublicUser {
            user_id: self.user_id,
            name: self.name,
            email: self.email,
            role: self.role,
            phone: self.phone,
            doctor_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User already exists")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    NotFound,

    #[error("Failed to issue session credential: {0}")]
    Token(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => AppError::ValidationError(msg),
            AuthError::DuplicateEmail => AppError::DuplicateEmail,
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::NotFound => AppError::NotFound("User not found".to_string()),
            AuthError::Token(msg) | AuthError::PasswordHash(msg) => AppError::Internal(msg),
            AuthError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
