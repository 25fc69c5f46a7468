pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::{DoctorError, DoctorProfile, DoctorRecord, UpdateDoctorProfileRequest};
pub use router::doctor_routes;
pub use services::DoctorService;
