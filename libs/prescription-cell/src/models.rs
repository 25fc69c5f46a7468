use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_config::MAX_UPLOAD_BYTES;
use shared_database::DbError;
use shared_models::error::AppError;

/// Stored prescription record. `file_path` is the public `/uploads/...` path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub prescription_id: i64,
    pub appointment_id: i64,
    pub file_path: String,
    pub file_name: String,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// A prescription file received from a doctor, before it is accepted.
#[derive(Debug, Clone)]
pub struct PrescriptionUpload {
    pub appointment_id: i64,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// File contents handed back for download, with the name it was uploaded under.
#[derive(Debug, Clone)]
pub struct PrescriptionFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum PrescriptionError {
    #[error("Please upload a file")]
    MissingFile,

    #[error("Appointment ID is required")]
    MissingAppointmentId,

    #[error("File too large. Maximum size is {} MB", MAX_UPLOAD_BYTES / (1024 * 1024))]
    FileTooLarge,

    #[error("Only PDF and image files are allowed")]
    UnsupportedFileType,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Cannot attach a prescription to a cancelled appointment")]
    AppointmentCancelled,

    #[error("Prescription not found")]
    NotFound,

    #[error("File not found")]
    FileMissing,

    #[error("{0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl From<PrescriptionError> for AppError {
    fn from(err: PrescriptionError) -> Self {
        match err {
            PrescriptionError::MissingFile
            | PrescriptionError::MissingAppointmentId => AppError::ValidationError(err.to_string()),
            PrescriptionError::Validation(msg) => AppError::ValidationError(msg),
            PrescriptionError::FileTooLarge => AppError::FileTooLarge(err.to_string()),
            PrescriptionError::UnsupportedFileType => AppError::UnsupportedFileType(err.to_string()),
            PrescriptionError::AppointmentNotFound
            | PrescriptionError::NotFound
            | PrescriptionError::FileMissing => AppError::NotFound(err.to_string()),
            PrescriptionError::AppointmentCancelled => AppError::InvalidTransition(err.to_string()),
            PrescriptionError::Storage(e) => AppError::Internal(e.to_string()),
            PrescriptionError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
