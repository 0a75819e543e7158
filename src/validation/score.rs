/*!
 * Review score validation.
 *
 * Scores are integers from 1 to 10 inclusive. The same bounds are
 * declared as a CHECK constraint in the schema, so a score that slips
 * past this validator still fails at write time.
 */

use crate::errors::ValidationError;

/// Minimum allowed review score
pub const MIN_SCORE: i64 = 1;

/// Maximum allowed review score
pub const MAX_SCORE: i64 = 10;

/// Validate a candidate review score.
pub fn validate_score(score: i64) -> Result<(), ValidationError> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(ValidationError::ScoreOutOfRange {
            score,
            min: MIN_SCORE,
            max: MAX_SCORE,
        });
    }
    Ok(())
}
