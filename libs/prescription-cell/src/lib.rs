pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::{Prescription, PrescriptionError, PrescriptionFile, PrescriptionUpload};
pub use router::prescription_routes;
pub use services::PrescriptionService;
