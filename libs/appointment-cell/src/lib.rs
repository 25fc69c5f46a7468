pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::{
    Appointment, AppointmentDetails, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    UpdateStatusRequest,
};
pub use router::appointment_routes;
pub use services::{AppointmentBookingService, AppointmentLifecycleService};
