/*!
 * Database module for persistent storage of the review catalog.
 *
 * This module provides SQLite-based persistence for:
 * - User accounts with roles and email confirmation
 * - The title catalog (categories, genres, titles)
 * - User-submitted reviews and comments
 */

// Allow dead code - database types are for library consumers
#![allow(dead_code)]

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::DatabaseConnection;
pub use repository::Repository;
