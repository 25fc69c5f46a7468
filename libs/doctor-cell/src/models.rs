use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DbError;
use shared_models::error::AppError;
use shared_utils::request::number_or_blank;

/// Directory entry: a doctor profile joined with its owner's contact details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub doctor_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub qualification: String,
    #[serde(default)]
    pub experience: i32,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub consultation_fee: f64,
    #[serde(default)]
    pub rating: f64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Bare `doctors` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub doctor_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub qualification: String,
    #[serde(default)]
    pub experience: i32,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub consultation_fee: f64,
    #[serde(default)]
    pub rating: f64,
}

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorProfileRequest {
    pub specialization: Option<String>,
    pub qualification: Option<String>,
    #[serde(default, deserialize_with = "number_or_blank::deserialize")]
    pub experience: Option<i32>,
    pub availability: Option<String>,
    #[serde(alias = "consultationFee", default, deserialize_with = "number_or_blank::deserialize")]
    pub consultation_fee: Option<f64>,
}

impl UpdateDoctorProfileRequest {
    pub fn is_empty(&self) -> bool {
        self.specialization.is_none()
            && self.qualification.is_none()
            && self.experience.is_none()
            && self.availability.is_none()
            && self.consultation_fee.is_none()
    }
}

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor profile not found")]
    ProfileNotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::ProfileNotFound => AppError::NotFound("Doctor profile not found".to_string()),
            DoctorError::Validation(msg) => AppError::ValidationError(msg),
            DoctorError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
