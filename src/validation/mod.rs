/*!
 * Field-level validation for user-submitted values.
 *
 * Each validator checks a single field and reports failures as
 * `ValidationError` values for the caller to surface. Validators never
 * mutate state; uniqueness and referential rules are left to the
 * database schema.
 */

pub mod email;
pub mod score;
pub mod slug;
pub mod username;
pub mod year;

pub use email::validate_email;
pub use score::validate_score;
pub use slug::validate_slug;
pub use username::validate_username;
pub use year::validate_year;

use crate::errors::ValidationError;

/// Check that a required text value is non-empty and within its length limit.
///
/// Lengths are counted in characters, not bytes, so multi-byte names are
/// not penalized.
pub fn validate_length(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    let length = value.chars().count();
    if length > max {
        return Err(ValidationError::TooLong { field, length, max });
    }

    Ok(())
}
