use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info, warn};

use shared_config::MAX_UPLOAD_BYTES;
use shared_database::{AppState, DbError, SupabaseClient, supabase::eq};
use shared_models::auth::User;

use crate::models::{Prescription, PrescriptionError, PrescriptionFile, PrescriptionUpload};

/// Public prefix under which stored files are served.
pub const UPLOADS_PREFIX: &str = "/uploads/";

// Raised by `record_prescription`.
const APPOINTMENT_NOT_FOUND: &str = "HC404";
const APPOINTMENT_CANCELLED: &str = "HC409";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFamily {
    Pdf,
    Image,
}

fn family_of_extension(ext: &str) -> Option<FileFamily> {
    match ext {
        "pdf" => Some(FileFamily::Pdf),
        "jpg" | "jpeg" | "png" | "gif" | "webp" => Some(FileFamily::Image),
        _ => None,
    }
}

fn family_of_content_type(content_type: &str) -> Option<FileFamily> {
    match content_type {
        "application/pdf" => Some(FileFamily::Pdf),
        "image/jpeg" | "image/png" | "image/gif" | "image/webp" => Some(FileFamily::Image),
        _ => None,
    }
}

/// Check a file against the accepted types and return its lowercased
/// extension. Name and declared content type must both be accepted and
/// name the same kind of document.
pub fn accepted_extension(file_name: &str, content_type: &str) -> Result<String, PrescriptionError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or(PrescriptionError::UnsupportedFileType)?;

    let content_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match (family_of_extension(&ext), family_of_content_type(&content_type)) {
        (Some(by_name), Some(by_type)) if by_name == by_type => Ok(ext),
        _ => Err(PrescriptionError::UnsupportedFileType),
    }
}

/// `prescription-{unix millis}-{random}.{ext}`
pub fn stored_file_name(ext: &str) -> String {
    format!(
        "prescription-{}-{}.{}",
        Utc::now().timestamp_millis(),
        rand::random::<u32>(),
        ext
    )
}

/// Map a recorded `/uploads/...` path back to a file inside `upload_dir`.
/// Only the final component is used, so a stored path cannot point outside.
pub fn resolve_stored_path(upload_dir: &Path, file_path: &str) -> Option<PathBuf> {
    let name = Path::new(file_path.strip_prefix(UPLOADS_PREFIX)?).file_name()?;
    Some(upload_dir.join(name))
}

pub struct PrescriptionService {
    supabase: Arc<SupabaseClient>,
    upload_dir: PathBuf,
}

impl PrescriptionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: Arc::clone(&state.db),
            upload_dir: state.config.upload_dir.clone(),
        }
    }

    /// Store a prescription for an appointment owned by the calling doctor.
    /// Recording the row and completing the appointment happen in one
    /// database transaction; if that fails the stored file is removed.
    pub async fn upload(&self, upload: PrescriptionUpload, user: &User) -> Result<Prescription, PrescriptionError> {
        debug!(
            "Doctor user {} uploading {} bytes for appointment {}",
            user.id,
            upload.bytes.len(),
            upload.appointment_id
        );

        if upload.bytes.len() > MAX_UPLOAD_BYTES {
            warn!("Rejected {} byte prescription upload", upload.bytes.len());
            return Err(PrescriptionError::FileTooLarge);
        }

        let ext = accepted_extension(&upload.file_name, &upload.content_type)?;
        let doctor_id = user.doctor_id.ok_or(PrescriptionError::AppointmentNotFound)?;

        tokio::fs::create_dir_all(&self.upload_dir).await?;

        let stored_name = stored_file_name(&ext);
        let stored_path = self.upload_dir.join(&stored_name);
        tokio::fs::write(&stored_path, &upload.bytes).await?;

        let args = json!({
            "p_appointment_id": upload.appointment_id,
            "p_doctor_id": doctor_id,
            "p_file_path": format!("{}{}", UPLOADS_PREFIX, stored_name),
            "p_file_name": upload.file_name,
        });

        let recorded: Result<Prescription, DbError> = self.supabase.rpc("record_prescription", args).await;

        match recorded {
            Ok(prescription) => {
                info!(
                    "Prescription {} stored for appointment {}",
                    prescription.prescription_id, prescription.appointment_id
                );
                Ok(prescription)
            }
            Err(e) => {
                if let Err(io) = tokio::fs::remove_file(&stored_path).await {
                    error!("Failed to remove orphaned upload {}: {}", stored_path.display(), io);
                }
                Err(match e.code() {
                    Some(APPOINTMENT_NOT_FOUND) => PrescriptionError::AppointmentNotFound,
                    Some(APPOINTMENT_CANCELLED) => PrescriptionError::AppointmentCancelled,
                    _ => PrescriptionError::Database(e),
                })
            }
        }
    }

    pub async fn list_for_appointment(&self, appointment_id: i64) -> Result<Vec<Prescription>, PrescriptionError> {
        debug!("Listing prescriptions for appointment {}", appointment_id);

        let prescriptions = self.supabase
            .select(&format!(
                "prescriptions?appointment_id={}&order=uploaded_at.desc,prescription_id.desc",
                eq(appointment_id)
            ))
            .await?;

        Ok(prescriptions)
    }

    pub async fn download(&self, prescription_id: i64) -> Result<PrescriptionFile, PrescriptionError> {
        debug!("Downloading prescription {}", prescription_id);

        let prescription: Prescription = self.supabase
            .select_one(&format!("prescriptions?prescription_id={}", eq(prescription_id)))
            .await?
            .ok_or(PrescriptionError::NotFound)?;

        let path = resolve_stored_path(&self.upload_dir, &prescription.file_path)
            .ok_or(PrescriptionError::FileMissing)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Prescription {} has no file at {}", prescription_id, path.display());
                return Err(PrescriptionError::FileMissing);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(PrescriptionFile {
            file_name: prescription.file_name,
            bytes,
        })
    }
}
