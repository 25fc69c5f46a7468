pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AuthError, AuthResponse, LoginRequest, PublicUser, RegisterRequest};
pub use router::auth_routes;
pub use services::credential::CredentialService;
