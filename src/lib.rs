/*!
 * # critica
 *
 * Persistence layer for a review-aggregation application: a catalog of
 * titles organized by category and genre, user-submitted scored reviews,
 * and comments on reviews.
 *
 * ## Features
 *
 * - SQLite-backed storage with uniqueness, cascade and check constraints
 *   declared in the schema
 * - User accounts with role-based authorization metadata
 *   (user / moderator / admin) and an email-confirmation workflow
 * - Field validators for usernames, release years, slugs, emails and
 *   review scores
 * - One review per (author, title) pair, enforced by the database
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `validation`: Field-level validators
 * - `database`: Storage layer:
 *   - `database::schema`: Table definitions and migrations
 *   - `database::connection`: Thread-safe SQLite access
 *   - `database::models`: Entity records
 *   - `database::repository`: High-level typed operations
 * - `errors`: Custom error types for validation and storage
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod errors;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::models::{
    CategoryRecord, CommentRecord, GenreRecord, ReviewRecord, TitleRecord, UserRecord, UserRole,
};
pub use database::{DatabaseConnection, Repository};
pub use errors::{StoreError, ValidationError};
