use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_database::{AppState, SupabaseClient, supabase::eq};

use crate::models::{DoctorError, DoctorProfile, DoctorRecord, UpdateDoctorProfileRequest};

#[derive(Debug, Deserialize)]
struct DoctorIdRow {
    doctor_id: i64,
}

pub struct DoctorService {
    supabase: Arc<SupabaseClient>,
}

impl DoctorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: Arc::clone(&state.db),
        }
    }

    /// All doctors, best rated first.
    pub async fn list_doctors(&self) -> Result<Vec<DoctorProfile>, DoctorError> {
        debug!("Listing doctor directory");

        let doctors = self.supabase
            .select("doctor_directory?order=rating.desc,doctor_id.asc")
            .await?;

        Ok(doctors)
    }

    pub async fn get_doctor(&self, doctor_id: i64) -> Result<DoctorProfile, DoctorError> {
        debug!("Fetching doctor profile: {}", doctor_id);

        self.supabase
            .select_one(&format!("doctor_directory?doctor_id={}", eq(doctor_id)))
            .await?
            .ok_or(DoctorError::NotFound)
    }

    /// Update the profile owned by `user_id`. Fails when the caller owns no
    /// profile instead of silently touching zero rows.
    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateDoctorProfileRequest,
    ) -> Result<DoctorRecord, DoctorError> {
        debug!("Updating doctor profile for user: {}", user_id);

        if request.is_empty() {
            return Err(DoctorError::Validation("No profile fields to update".to_string()));
        }
        if request.experience.is_some_and(|e| e < 0) {
            return Err(DoctorError::Validation("Experience cannot be negative".to_string()));
        }
        if request.consultation_fee.is_some_and(|f| f < 0.0 || !f.is_finite()) {
            return Err(DoctorError::Validation(
                "Consultation fee must be a non-negative amount".to_string(),
            ));
        }

        let mut update_data = serde_json::Map::new();

        if let Some(specialization) = request.specialization {
            update_data.insert("specialization".to_string(), json!(specialization));
        }
        if let Some(qualification) = request.qualification {
            update_data.insert("qualification".to_string(), json!(qualification));
        }
        if let Some(experience) = request.experience {
            update_data.insert("experience".to_string(), json!(experience));
        }
        if let Some(availability) = request.availability {
            update_data.insert("availability".to_string(), json!(availability));
        }
        if let Some(fee) = request.consultation_fee {
            update_data.insert("consultation_fee".to_string(), json!(fee));
        }

        let updated: Vec<DoctorRecord> = self.supabase
            .update(&format!("doctors?user_id={}", eq(user_id)), Value::Object(update_data))
            .await?;

        let doctor = updated.into_iter().next().ok_or(DoctorError::ProfileNotFound)?;

        info!("Doctor profile {} updated", doctor.doctor_id);
        Ok(doctor)
    }

    /// Doctor id owned by a user, if any.
    pub async fn find_doctor_id_by_user(&self, user_id: i64) -> Result<Option<i64>, DoctorError> {
        let row: Option<DoctorIdRow> = self.supabase
            .select_one(&format!("doctors?select=doctor_id&user_id={}", eq(user_id)))
            .await?;

        Ok(row.map(|r| r.doctor_id))
    }

    pub async fn doctor_exists(&self, doctor_id: i64) -> Result<bool, DoctorError> {
        let row: Option<DoctorIdRow> = self.supabase
            .select_one(&format!("doctors?select=doctor_id&doctor_id={}", eq(doctor_id)))
            .await?;

        Ok(row.is_some())
    }
}
