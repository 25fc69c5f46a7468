use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use shared_database::{AppState, SupabaseClient, supabase::eq};
use shared_models::auth::{Role, User};

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

/// What a caller may do with an appointment they are trying to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Authority {
    /// Owning doctor: any legal transition.
    Doctor,
    /// Owning patient: cancellation only.
    Patient,
    None,
}

fn authority(user: &User, appointment: &Appointment) -> Authority {
    match user.role {
        Role::Doctor if user.doctor_id == Some(appointment.doctor_id) => Authority::Doctor,
        Role::Patient if user.id == appointment.patient_id => Authority::Patient,
        _ => Authority::None,
    }
}

pub struct AppointmentLifecycleService {
    supabase: Arc<SupabaseClient>,
}

impl AppointmentLifecycleService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: Arc::clone(&state.db),
        }
    }

    /// Move an appointment along the status table on behalf of `user`.
    pub async fn update_status(
        &self,
        appointment_id: i64,
        raw_status: Option<&str>,
        user: &User,
    ) -> Result<Appointment, AppointmentError> {
        let next: AppointmentStatus = raw_status.unwrap_or_default().parse()?;

        debug!("User {} requests appointment {} -> {}", user.id, appointment_id, next);

        let current = self.fetch(&format!("appointment_id={}", eq(appointment_id)))
            .await?
            .ok_or(AppointmentError::NotFound)?;

        match authority(user, &current) {
            Authority::Doctor => {}
            Authority::Patient if next == AppointmentStatus::Cancelled => {}
            Authority::Patient | Authority::None => {
                warn!("User {} may not set appointment {} to {}", user.id, appointment_id, next);
                return Err(AppointmentError::Forbidden);
            }
        }

        current.status.validate_transition(next)?;

        self.compare_and_set(&current, next, None).await
    }

    /// Patient-side cancellation. Appointments the patient does not own are
    /// reported as missing.
    pub async fn cancel(&self, appointment_id: i64, patient_id: i64) -> Result<Appointment, AppointmentError> {
        debug!("Patient {} cancels appointment {}", patient_id, appointment_id);

        let owner_filter = format!("patient_id={}", eq(patient_id));
        let current = self.fetch(&format!("appointment_id={}&{}", eq(appointment_id), owner_filter))
            .await?
            .ok_or(AppointmentError::NotFound)?;

        current.status.validate_transition(AppointmentStatus::Cancelled)?;

        self.compare_and_set(&current, AppointmentStatus::Cancelled, Some(&owner_filter)).await
    }

    async fn fetch(&self, filter: &str) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.supabase.select_one(&format!("appointments?{}", filter)).await?)
    }

    /// Write `next` only if the row still holds the status it was read with.
    /// A concurrent writer that got there first turns into `InvalidTransition`.
    async fn compare_and_set(
        &self,
        current: &Appointment,
        next: AppointmentStatus,
        extra_filter: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let mut query = format!(
            "appointments?appointment_id={}&status={}",
            eq(current.appointment_id),
            eq(current.status)
        );
        if let Some(filter) = extra_filter {
            query.push('&');
            query.push_str(filter);
        }

        let updated: Vec<Appointment> = self.supabase
            .update(&query, json!({ "status": next.as_str() }))
            .await?;

        match updated.into_iter().next() {
            Some(appointment) => {
                info!("Appointment {} moved {} -> {}", appointment.appointment_id, current.status, next);
                Ok(appointment)
            }
            None => {
                let latest = self.fetch(&format!("appointment_id={}", eq(current.appointment_id)))
                    .await?
                    .ok_or(AppointmentError::NotFound)?;
                warn!(
                    "Appointment {} changed to {} concurrently",
                    latest.appointment_id, latest.status
                );
                Err(AppointmentError::InvalidTransition { from: latest.status, to: next })
            }
        }
    }
}
