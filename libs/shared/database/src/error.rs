use serde::Deserialize;
use thiserror::Error;

/// PostgreSQL SQLSTATE for unique_violation.
pub const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for foreign_key_violation.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Foreign key violated: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}) [{code}]: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl DbError {
    /// SQLSTATE (or PostgREST code) reported by the store, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            DbError::UniqueViolation { .. } => Some(UNIQUE_VIOLATION),
            DbError::ForeignKeyViolation { .. } => Some(FOREIGN_KEY_VIOLATION),
            DbError::Api { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        matches!(self, DbError::UniqueViolation { constraint: c } if c == constraint)
    }

    /// Build from a non-success PostgREST response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct PostgrestError {
            code: Option<String>,
            message: Option<String>,
        }

        let parsed = serde_json::from_str::<PostgrestError>(body).ok();
        let code = parsed.as_ref().and_then(|p| p.code.clone()).unwrap_or_default();
        let message = parsed
            .and_then(|p| p.message)
            .unwrap_or_else(|| body.to_string());

        match code.as_str() {
            UNIQUE_VIOLATION => DbError::UniqueViolation {
                constraint: constraint_name(&message).unwrap_or_default(),
            },
            FOREIGN_KEY_VIOLATION => DbError::ForeignKeyViolation { message },
            _ if status == 404 && code.is_empty() => DbError::NotFound(message),
            _ => DbError::Api { status, code, message },
        }
    }
}

// Postgres reports `duplicate key value violates unique constraint "name"`.
fn constraint_name(message: &str) -> Option<String> {
    let start = message.find('"')? + 1;
    let len = message[start..].find('"')?;
    Some(message[start..start + len].to_string())
}
