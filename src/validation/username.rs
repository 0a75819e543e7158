/*!
 * Username validation.
 *
 * Usernames may contain Unicode word characters plus `.`, `@`, `+` and `-`,
 * must fit in 150 characters, and the literal `me` is reserved because the
 * account endpoints use it to address the current user.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ValidationError;

/// Maximum username length in characters
pub const MAX_USERNAME_LENGTH: usize = 150;

/// The reserved self-referencing username
pub const RESERVED_USERNAME: &str = "me";

/// Permitted username characters: Unicode word characters and `.@+-`
static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("Invalid username regex"));

/// Validate a candidate username.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::Empty { field: "username" });
    }

    if username == RESERVED_USERNAME {
        return Err(ValidationError::Reserved {
            field: "username",
            value: username.to_string(),
        });
    }

    let length = username.chars().count();
    if length > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "username",
            length,
            max: MAX_USERNAME_LENGTH,
        });
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidFormat {
            field: "username",
            value: username.to_string(),
        });
    }

    Ok(())
}
