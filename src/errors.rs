/*!
 * Error types for the critica persistence layer.
 *
 * This module contains custom error types for validation and storage,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Field-level validation failures.
///
/// These are user-correctable: the caller is expected to surface them
/// back through whatever form or API layer submitted the value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A value that is reserved and cannot be used
    #[error("{field} '{value}' is reserved and cannot be used")]
    Reserved {
        /// Field name
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// A value that does not match the required format
    #[error("{field} '{value}' contains invalid characters")]
    InvalidFormat {
        /// Field name
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// A value that is empty but required
    #[error("{field} must not be empty")]
    Empty {
        /// Field name
        field: &'static str,
    },

    /// A value exceeding its maximum length
    #[error("{field} is {length} characters long, maximum is {max}")]
    TooLong {
        /// Field name
        field: &'static str,
        /// Actual length in characters
        length: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// A year in the future
    #[error("year {year} is later than the current year {current}")]
    YearInFuture {
        /// Rejected year
        year: i32,
        /// Current calendar year at validation time
        current: i32,
    },

    /// A review score outside the allowed range
    #[error("score {score} is out of range, must be between {min} and {max}")]
    ScoreOutOfRange {
        /// Rejected score
        score: i64,
        /// Minimum allowed score
        min: i64,
        /// Maximum allowed score
        max: i64,
    },

    /// An unknown role name
    #[error("'{value}' is not a valid role")]
    InvalidRole {
        /// Offending value
        value: String,
    },
}

/// Errors surfaced by the storage layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Field validation failed before the write was attempted
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A uniqueness, foreign-key or check constraint was violated at write time
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// Any other error reported by the database engine
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A requested record does not exist
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Lookup key that failed
        key: String,
    },

    /// The connection mutex was poisoned by a panicking thread
    #[error("failed to acquire database lock: {0}")]
    Lock(String),

    /// A blocking database task panicked or was cancelled
    #[error("database task failed: {0}")]
    TaskJoin(String),

    /// The database file location could not be determined or created
    #[error("database path error: {0}")]
    Path(String),

    /// The on-disk schema version cannot be upgraded
    #[error("schema migration error: {0}")]
    Migration(String),
}

impl StoreError {
    /// Convert a rusqlite error, mapping constraint failures to `Integrity`.
    ///
    /// SQLite reports unique, foreign-key and CHECK violations as
    /// `SqliteFailure` with the constraint error code; everything else
    /// passes through as a plain database error.
    pub fn from_sqlite(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Integrity(
                    msg.clone().unwrap_or_else(|| "constraint violation".to_string()),
                )
            }
            _ => StoreError::Database(err),
        }
    }

    /// Whether this error is an integrity violation
    pub fn is_integrity(&self) -> bool {
        matches!(self, StoreError::Integrity(_))
    }

    /// Whether this error is a field validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}
