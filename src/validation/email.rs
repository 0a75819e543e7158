/*!
 * Email address validation.
 *
 * A light structural check: one `@`, non-empty local part, and a dotted
 * domain, within 254 characters. Actual deliverability is confirmed by
 * the out-of-band confirmation-code flow.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ValidationError;

/// Maximum email length in characters
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Structural email shape: local@domain.tld with no whitespace
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid email regex"));

/// Validate a candidate email address.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::Empty { field: "email" });
    }

    let length = email.chars().count();
    if length > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email",
            length,
            max: MAX_EMAIL_LENGTH,
        });
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            value: email.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validateEmail_withWellFormedAddress_shouldPass() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
    }

    #[test]
    fn test_validateEmail_withMalformedAddress_shouldFail() {
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("spaces in@example.com").is_err());
    }

    #[test]
    fn test_validateEmail_withEmptyValue_shouldFail() {
        assert_eq!(
            validate_email(""),
            Err(ValidationError::Empty { field: "email" })
        );
    }

    #[test]
    fn test_validateEmail_overLengthLimit_shouldFail() {
        let local = "a".repeat(MAX_EMAIL_LENGTH);
        let email = format!("{}@example.com", local);
        assert!(matches!(
            validate_email(&email),
            Err(ValidationError::TooLong { .. })
        ));
    }
}
