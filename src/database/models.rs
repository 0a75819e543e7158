/*!
 * Database entity models.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;

/// Maximum length for category, genre and title names
pub const MAX_NAME_LENGTH: usize = 256;

/// Authorization role attached to a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Ordinary account, may post reviews and comments
    #[default]
    User,
    /// May edit or remove any review or comment
    Moderator,
    /// Full control, including catalog and account administration
    Admin,
}

impl UserRole {
    /// Whether this role grants moderation rights over other users' content
    pub fn can_moderate(&self) -> bool {
        matches!(self, UserRole::Moderator | UserRole::Admin)
    }

    /// Whether this role grants administrative rights
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Moderator => write!(f, "moderator"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "moderator" => Ok(UserRole::Moderator),
            "admin" => Ok(UserRole::Admin),
            _ => Err(ValidationError::InvalidRole {
                value: s.to_string(),
            }),
        }
    }
}

/// User account record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Database ID
    pub id: i64,
    /// Unique username
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Given name, may be empty
    pub first_name: String,
    /// Family name, may be empty
    pub last_name: String,
    /// Authorization role
    pub role: UserRole,
    /// Free-text biography
    pub bio: String,
    /// Opaque token for the email-confirmation flow, cleared on confirmation
    pub confirmation_code: Option<String>,
    /// Registration timestamp (ISO 8601)
    pub date_joined: String,
}

impl UserRecord {
    /// Create a new user record with the default role
    pub fn new(username: String, email: String) -> Self {
        Self {
            id: 0, // Will be assigned by database
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            role: UserRole::default(),
            bio: String::new(),
            confirmation_code: None,
            date_joined: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a new user record with an explicit role
    pub fn with_role(username: String, email: String, role: UserRole) -> Self {
        Self {
            role,
            ..Self::new(username, email)
        }
    }
}

impl fmt::Display for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)
    }
}

/// Category record: a title belongs to at most one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Database ID
    pub id: i64,
    /// Human-readable name
    pub name: String,
    /// Unique URL-safe identifier
    pub slug: String,
}

impl CategoryRecord {
    /// Create a new category record
    pub fn new(name: String, slug: String) -> Self {
        Self { id: 0, name, slug }
    }
}

impl fmt::Display for CategoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug)
    }
}

/// Genre record: titles and genres form a many-to-many relation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreRecord {
    /// Database ID
    pub id: i64,
    /// Human-readable name
    pub name: String,
    /// Unique URL-safe identifier
    pub slug: String,
}

impl GenreRecord {
    /// Create a new genre record
    pub fn new(name: String, slug: String) -> Self {
        Self { id: 0, name, slug }
    }
}

impl fmt::Display for GenreRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug)
    }
}

/// Title record: a reviewable work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleRecord {
    /// Database ID
    pub id: i64,
    /// Name of the work
    pub name: String,
    /// Release year
    pub year: i32,
    /// Optional description
    pub description: Option<String>,
    /// Category, cleared if the category is deleted
    pub category_id: Option<i64>,
}

impl TitleRecord {
    /// Create a new title record
    pub fn new(name: String, year: i32) -> Self {
        Self {
            id: 0,
            name,
            year,
            description: None,
            category_id: None,
        }
    }
}

/// Review record: one user's scored review of a title.
///
/// A user may review each title at most once; `pub_date` is set at
/// creation and never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Database ID
    pub id: i64,
    /// Reviewed title, review is deleted with it
    pub title_id: i64,
    /// Review author, review is deleted with them
    pub author_id: i64,
    /// Review body
    pub text: String,
    /// Score from 1 to 10
    pub score: i64,
    /// Publication timestamp (ISO 8601), immutable
    pub pub_date: String,
}

impl ReviewRecord {
    /// Create a new review record
    pub fn new(title_id: i64, author_id: i64, text: String, score: i64) -> Self {
        Self {
            id: 0,
            title_id,
            author_id,
            text,
            score,
            pub_date: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Comment record: a remark attached to a review.
///
/// The author reference is optional so a comment can outlive the form
/// that produced it; `pub_date` is set at creation and never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    /// Database ID
    pub id: i64,
    /// Commented review, comment is deleted with it
    pub review_id: i64,
    /// Comment author, may be absent
    pub author_id: Option<i64>,
    /// Comment body
    pub text: String,
    /// Publication timestamp (ISO 8601), immutable
    pub pub_date: String,
}

impl CommentRecord {
    /// Create a new comment record
    pub fn new(review_id: i64, author_id: Option<i64>, text: String) -> Self {
        Self {
            id: 0,
            review_id,
            author_id,
            text,
            pub_date: chrono::Utc::now().to_rfc3339(),
        }
    }
}
