use uuid::Uuid;

/// Opaque video-call link for a new appointment. Random per call, so two
/// bookings in the same instant never share a room.
pub fn meeting_link(base_url: &str) -> String {
    format!(
        "{}/medconnect-{}",
        base_url.trim_end_matches('/'),
        Uuid::new_v4().simple()
    )
}
