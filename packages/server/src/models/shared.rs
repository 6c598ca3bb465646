use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::error::AppError;

/// Parse a path identifier. A malformed ID cannot name an existing row, so it
/// gets the same 404 as a missing one.
pub fn parse_id(raw: &str, resource: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{resource} not found")))
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a trimmed display name (1-`max` Unicode characters) and return it trimmed.
pub fn validate_name<'a>(value: &'a str, field: &str, max: usize) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be 1-{max} characters"
        )));
    }
    Ok(trimmed)
}

/// Validate free text that may be long but must not be blank.
pub fn validate_text<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    validate_name(value, field, 10_000)
}
