use std::sync::Arc;

use axum::{
    extract::{multipart::{MultipartError, MultipartRejection}, Extension, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use tracing::debug;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::request::Json;
use shared_utils::validation::parse_id;

use crate::models::{PrescriptionError, PrescriptionUpload};
use crate::services::PrescriptionService;

/// Multipart part carrying the file.
pub const FILE_FIELD: &str = "prescription";
pub const APPOINTMENT_FIELD: &str = "appointment_id";

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PrescriptionError::FileTooLarge.into()
    } else {
        AppError::ValidationError(err.body_text())
    }
}

/// Header-safe rendition of an uploaded file name.
fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() || !c.is_ascii() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

#[axum::debug_handler]
pub async fn upload_prescription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut multipart = multipart?;
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut appointment_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            APPOINTMENT_FIELD => {
                appointment_id = Some(field.text().await.map_err(multipart_error)?);
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let (file_name, content_type, bytes) = file.ok_or(PrescriptionError::MissingFile)?;
    let appointment_id = appointment_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(PrescriptionError::MissingAppointmentId)?;
    let appointment_id = parse_id(&appointment_id, "appointment id")?;

    let prescription_service = PrescriptionService::new(&state);
    let prescription = prescription_service
        .upload(
            PrescriptionUpload {
                appointment_id,
                file_name,
                content_type,
                bytes,
            },
            &user,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Prescription uploaded successfully",
            "prescription": prescription
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_prescriptions(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = parse_id(&appointment_id, "appointment id")?;

    let prescription_service = PrescriptionService::new(&state);
    let prescriptions = prescription_service.list_for_appointment(appointment_id).await?;

    Ok(Json(json!({ "prescriptions": prescriptions })))
}

#[axum::debug_handler]
pub async fn download_prescription(
    State(state): State<Arc<AppState>>,
    Path(prescription_id): Path<String>,
) -> Result<Response, AppError> {
    let prescription_id = parse_id(&prescription_id, "prescription id")?;

    let prescription_service = PrescriptionService::new(&state);
    let file = prescription_service.download(prescription_id).await?;

    let content_type = mime_guess::from_path(&file.file_name)
        .first_or_octet_stream()
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, attachment_disposition(&file.file_name)),
        ],
        file.bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_disposition() {
        assert_eq!(attachment_disposition("rx.pdf"), "attachment; filename=\"rx.pdf\"");
        assert_eq!(attachment_disposition("a\"b\n.pdf"), "attachment; filename=\"a_b_.pdf\"");
        assert_eq!(attachment_disposition("réçu.pdf"), "attachment; filename=\"r__u.pdf\"");
    }
}
