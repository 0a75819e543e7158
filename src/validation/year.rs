/*!
 * Release year validation.
 *
 * A title's year must not be later than the current calendar year.
 * No lower bound is enforced.
 */

use chrono::{Datelike, Utc};

use crate::errors::ValidationError;

/// Validate a release year against the current calendar year.
pub fn validate_year(year: i32) -> Result<(), ValidationError> {
    validate_year_against(year, Utc::now().year())
}

/// Validate a release year against an explicit current year.
pub fn validate_year_against(year: i32, current: i32) -> Result<(), ValidationError> {
    if year > current {
        return Err(ValidationError::YearInFuture { year, current });
    }
    Ok(())
}
