use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_database::{AppState, SupabaseClient, supabase::eq};
use shared_models::auth::{Role, User};
use shared_utils::jwt::issue_token;

use crate::models::{
    AuthError, AuthResponse, LoginRequest, PublicUser, RegisterRequest,
    RegisteredAccount, UserRecord,
};
use crate::services::password::PasswordService;

const MIN_PASSWORD_LEN: usize = 6;
const EMAIL_CONSTRAINT: &str = "users_email_key";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

/// Emails are compared case-insensitively: stored and looked up lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(value: Option<String>, field: &str) -> Result<String, AuthError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::Validation(format!("Please provide all required fields ({} missing)", field)))
}

#[derive(Debug, Deserialize)]
struct DoctorIdRow {
    doctor_id: i64,
}

pub struct CredentialService {
    supabase: Arc<SupabaseClient>,
    jwt_secret: String,
}

impl CredentialService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: Arc::clone(&state.db),
            jwt_secret: state.config.jwt_secret.clone(),
        }
    }

    /// Create an account (and, for doctors, the linked profile) and sign a
    /// session credential for it.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let name = required(request.name, "name")?;
        let email = normalize_email(&required(request.email, "email")?);
        let password = request
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AuthError::Validation("Please provide all required fields (password missing)".to_string()))?;
        let role: Role = required(request.role, "role")?
            .parse()
            .map_err(AuthError::Validation)?;

        debug!("Registering new {} account", role);

        if !email_pattern().is_match(&email) {
            return Err(AuthError::Validation("Please provide a valid email address".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if request.experience.is_some_and(|e| e < 0) {
            return Err(AuthError::Validation("Experience cannot be negative".to_string()));
        }
        if request.consultation_fee.is_some_and(|f| f < 0.0 || !f.is_finite()) {
            return Err(AuthError::Validation("Consultation fee must be a non-negative amount".to_string()));
        }

        let existing: Option<serde_json::Value> = self.supabase
            .select_one(&format!("users?select=user_id&email={}", eq(&email)))
            .await?;
        if existing.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = tokio::task::spawn_blocking(move || PasswordService::hash_password(&password))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

        let is_doctor = role == Role::Doctor;
        let args = json!({
            "p_name": name,
            "p_email": email,
            "p_password": password_hash,
            "p_role": role.as_str(),
            "p_phone": request.phone.filter(|p| !p.trim().is_empty()),
            "p_specialization": if is_doctor { request.specialization } else { None },
            "p_qualification": if is_doctor { request.qualification } else { None },
            "p_experience": if is_doctor { request.experience } else { None },
            "p_availability": if is_doctor { request.availability } else { None },
            "p_consultation_fee": if is_doctor { request.consultation_fee } else { None },
        });

        let account: RegisteredAccount = self.supabase
            .rpc("register_account", args)
            .await
            .map_err(|e| {
                // A concurrent registration can win after the pre-check
                if e.is_unique_violation(EMAIL_CONSTRAINT) {
                    AuthError::DuplicateEmail
                } else {
                    AuthError::Database(e)
                }
            })?;

        let token = issue_token(
            account.user_id,
            &account.email,
            account.role,
            account.doctor_id,
            &self.jwt_secret,
        ).map_err(AuthError::Token)?;

        info!("Registered user {} as {}", account.user_id, account.role);

        Ok(AuthResponse {
            token,
            user: account.into(),
        })
    }

    /// Verify credentials. Unknown email and wrong password are reported
    /// identically.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = request.email.map(|e| normalize_email(&e)).unwrap_or_default();
        let password = request.password.unwrap_or_default();

        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("Please provide email and password".to_string()));
        }

        let record: UserRecord = self.supabase
            .select_one(&format!("users?email={}", eq(&email)))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = record.password.clone();
        let verified = tokio::task::spawn_blocking(move || PasswordService::verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

        match verified {
            Ok(true) => {}
            Ok(false) => return Err(AuthError::InvalidCredentials),
            Err(e) => {
                warn!("Stored verifier for user {} could not be parsed: {}", record.user_id, e);
                return Err(AuthError::InvalidCredentials);
            }
        }

        let doctor_id = if record.role == Role::Doctor {
            self.find_doctor_id(record.user_id).await?
        } else {
            None
        };

        let token = issue_token(record.user_id, &record.email, record.role, doctor_id, &self.jwt_secret)
            .map_err(AuthError::Token)?;

        info!("User {} logged in", record.user_id);

        Ok(AuthResponse {
            token,
            user: record.into_public(doctor_id),
        })
    }

    /// Public record of the credential's subject.
    pub async fn get_current_user(&self, user: &User) -> Result<PublicUser, AuthError> {
        debug!("Fetching current user {}", user.id);

        let record: UserRecord = self.supabase
            .select_one(&format!("users?user_id={}", eq(user.id)))
            .await?
            .ok_or(AuthError::NotFound)?;

        Ok(record.into_public(user.doctor_id))
    }

    async fn find_doctor_id(&self, user_id: i64) -> Result<Option<i64>, AuthError> {
        let row: Option<DoctorIdRow> = self.supabase
            .select_one(&format!("doctors?select=doctor_id&user_id={}", eq(user_id)))
            .await?;
        Ok(row.map(|r| r.doctor_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@X.com "), "a@x.com");
    }

    #[test]
    fn test_email_pattern() {
        assert!(email_pattern().is_match("a@x.com"));
        assert!(!email_pattern().is_match("a@x"));
        assert!(!email_pattern().is_match("a x@y.com"));
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required(Some(" Ann ".into()), "name").unwrap(), "Ann");
        assert!(required(Some("   ".into()), "name").is_err());
        assert!(required(None, "name").is_err());
    }
}
