pub mod booking;
pub mod lifecycle;
pub mod meeting;

pub use booking::AppointmentBookingService;
pub use lifecycle::AppointmentLifecycleService;
