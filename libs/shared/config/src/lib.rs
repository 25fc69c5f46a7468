use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Session credentials are valid for seven days after issuance.
pub const SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Upload ceiling for prescription files (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub jwt_secret: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub meeting_base_url: String,
    pub frontend_url: Option<String>,
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            port: env::var("PORT")
                .ok()
                .and_then(|p| match p.parse::<u16>() {
                    Ok(port) => Some(port),
                    Err(_) => {
                        warn!("PORT '{}' is not a valid port, using default", p);
                        None
                    }
                })
                .unwrap_or(5000),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            meeting_base_url: env::var("MEETING_BASE_URL")
                .unwrap_or_else(|_| "https://meet.jit.si".to_string()),
            frontend_url: env::var("FRONTEND_URL").ok().filter(|u| !u.is_empty()),
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_key.is_empty()
            && !self.jwt_secret.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "service-key".to_string(),
            jwt_secret: "secret".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            meeting_base_url: "https://meet.jit.si".to_string(),
            frontend_url: None,
            seed_demo_data: false,
        }
    }

    #[test]
    fn test_is_configured() {
        assert!(config().is_configured());

        let mut missing_secret = config();
        missing_secret.jwt_secret.clear();
        assert!(!missing_secret.is_configured());
    }

    #[test]
    fn test_limits() {
        assert_eq!(SESSION_TTL_SECONDS, 604_800);
        assert_eq!(MAX_UPLOAD_BYTES, 5_242_880);
    }
}
