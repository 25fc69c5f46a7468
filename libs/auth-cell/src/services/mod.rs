pub mod credential;
pub mod password;

pub use credential::CredentialService;
pub use password::PasswordService;
