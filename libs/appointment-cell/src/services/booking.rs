use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use doctor_cell::DoctorService;
use shared_database::{AppState, DbError, SupabaseClient, supabase::eq};
use shared_models::auth::User;

use crate::models::{
    Appointment, AppointmentDetails, AppointmentError, AppointmentStatus, BookAppointmentRequest,
};
use crate::services::meeting::meeting_link;

/// Partial unique index over (doctor_id, appointment_date, appointment_time)
/// for rows that are not cancelled.
pub const ACTIVE_SLOT_CONSTRAINT: &str = "appointments_active_slot_key";

const BASE_COLUMNS: &str =
    "appointment_id,patient_id,doctor_id,appointment_date,appointment_time,status,video_link,notes,created_at";
const NEWEST_FIRST: &str = "order=appointment_date.desc,appointment_time.desc";

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppointmentError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppointmentError::Validation("Invalid appointment date, expected YYYY-MM-DD".to_string()))
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, AppointmentError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AppointmentError::Validation("Invalid appointment time, expected HH:MM".to_string()))
}

pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    doctor_service: DoctorService,
    meeting_base_url: String,
}

impl AppointmentBookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: Arc::clone(&state.db),
            doctor_service: DoctorService::new(state),
            meeting_base_url: state.config.meeting_base_url.clone(),
        }
    }

    /// Book a slot for `patient_id`. The slot is held by at most one
    /// non-cancelled appointment; the database index enforces it when two
    /// bookings race past the pre-check.
    pub async fn book_appointment(
        &self,
        patient_id: i64,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let (doctor_id, raw_date, raw_time) = match (
            request.doctor_id,
            request.appointment_date.filter(|d| !d.trim().is_empty()),
            request.appointment_time.filter(|t| !t.trim().is_empty()),
        ) {
            (Some(doctor_id), Some(date), Some(time)) => (doctor_id, date, time),
            _ => {
                return Err(AppointmentError::Validation(
                    "Please provide all required fields".to_string(),
                ))
            }
        };

        let date = parse_date(&raw_date)?;
        let time = parse_time(&raw_time)?;
        let date_str = date.format("%Y-%m-%d").to_string();
        let time_str = time.format("%H:%M:%S").to_string();

        debug!("Booking doctor {} on {} at {} for patient {}", doctor_id, date_str, time_str, patient_id);

        if !self.doctor_service.doctor_exists(doctor_id).await? {
            return Err(AppointmentError::DoctorNotFound);
        }

        let taken: Vec<Value> = self.supabase
            .select(&format!(
                "appointments?select=appointment_id&doctor_id={}&appointment_date={}&appointment_time={}&status=neq.cancelled",
                eq(doctor_id),
                eq(&date_str),
                eq(&time_str),
            ))
            .await?;

        if !taken.is_empty() {
            warn!("Slot {} {} for doctor {} already booked", date_str, time_str, doctor_id);
            return Err(AppointmentError::SlotConflict);
        }

        let row = json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "appointment_date": date_str,
            "appointment_time": time_str,
            "status": AppointmentStatus::Scheduled.as_str(),
            "video_link": meeting_link(&self.meeting_base_url),
            "notes": request.notes.unwrap_or_default(),
        });

        let appointment: Appointment = self.supabase
            .insert("appointments", row)
            .await
            .map_err(|e| match e {
                e if e.is_unique_violation(ACTIVE_SLOT_CONSTRAINT) => {
                    warn!("Lost booking race for doctor {} on {} at {}", doctor_id, date_str, time_str);
                    AppointmentError::SlotConflict
                }
                DbError::ForeignKeyViolation { .. } => AppointmentError::DoctorNotFound,
                e => AppointmentError::Database(e),
            })?;

        info!("Appointment {} booked with doctor {}", appointment.appointment_id, doctor_id);
        Ok(appointment)
    }

    /// Patient's appointments with the doctor's name, specialization, fee and phone.
    pub async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        debug!("Listing appointments for patient {}", patient_id);

        let appointments = self.supabase
            .select(&format!(
                "appointment_details?select={},doctor_name,specialization,consultation_fee,doctor_phone&patient_id={}&{}",
                BASE_COLUMNS,
                eq(patient_id),
                NEWEST_FIRST,
            ))
            .await?;

        Ok(appointments)
    }

    /// Appointments of the doctor profile owned by `user_id`, with patient
    /// contact details.
    pub async fn list_for_doctor(&self, user_id: i64) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        debug!("Listing appointments for doctor user {}", user_id);

        let doctor_id = self.doctor_service
            .find_doctor_id_by_user(user_id)
            .await?
            .ok_or(AppointmentError::DoctorProfileNotFound)?;

        let appointments = self.supabase
            .select(&format!(
                "appointment_details?select={},patient_name,patient_email,patient_phone&doctor_id={}&{}",
                BASE_COLUMNS,
                eq(doctor_id),
                NEWEST_FIRST,
            ))
            .await?;

        Ok(appointments)
    }

    /// A single appointment, visible only to its patient and its doctor.
    pub async fn get_appointment(
        &self,
        appointment_id: i64,
        user: &User,
    ) -> Result<AppointmentDetails, AppointmentError> {
        debug!("Fetching appointment {} for user {}", appointment_id, user.id);

        let details: AppointmentDetails = self.supabase
            .select_one(&format!("appointment_details?appointment_id={}", eq(appointment_id)))
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if !details.appointment.is_party(user.id, user.doctor_id) {
            return Err(AppointmentError::NotFound);
        }

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(parse_time("10:00").unwrap(), NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(parse_time("14:30:15").unwrap(), NaiveTime::from_hms_opt(14, 30, 15).unwrap());
        assert_matches!(parse_time("25:00"), Err(AppointmentError::Validation(_)));
        assert_matches!(parse_time("10am"), Err(AppointmentError::Validation(_)));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2030-05-01").unwrap(), NaiveDate::from_ymd_opt(2030, 5, 1).unwrap());
        assert_matches!(parse_date("01/05/2030"), Err(AppointmentError::Validation(_)));
        assert_matches!(parse_date("2030-02-30"), Err(AppointmentError::Validation(_)));
    }
}
