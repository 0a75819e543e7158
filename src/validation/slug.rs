/*!
 * Slug validation for categories and genres.
 *
 * Slugs are URL-safe short identifiers: ASCII letters, digits, hyphens
 * and underscores, at most 50 characters.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ValidationError;

/// Maximum slug length in characters
pub const MAX_SLUG_LENGTH: usize = 50;

/// Permitted slug characters
static SLUG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("Invalid slug regex"));

/// Validate a candidate slug.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(ValidationError::Empty { field: "slug" });
    }

    let length = slug.chars().count();
    if length > MAX_SLUG_LENGTH {
        return Err(ValidationError::TooLong {
            field: "slug",
            length,
            max: MAX_SLUG_LENGTH,
        });
    }

    if !SLUG_REGEX.is_match(slug) {
        return Err(ValidationError::InvalidFormat {
            field: "slug",
            value: slug.to_string(),
        });
    }

    Ok(())
}
