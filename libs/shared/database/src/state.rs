use std::sync::Arc;

use shared_config::AppConfig;

use crate::supabase::SupabaseClient;

/// Shared application state: configuration plus the one database handle
/// every cell service borrows.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<SupabaseClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let db = Arc::new(SupabaseClient::new(&config));
        Self {
            config: Arc::new(config),
            db,
        }
    }
}
