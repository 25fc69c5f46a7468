use shared_models::error::AppError;

/// Parse a numeric path or form id, rejecting anything that is not a
/// positive integer.
pub fn parse_id(raw: &str, label: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::ValidationError(format!("Invalid {}", label)))
}
