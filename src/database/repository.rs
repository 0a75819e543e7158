/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for all database operations,
 * abstracting away the SQL details and providing type-safe access.
 * Field validators run before writes; uniqueness, foreign-key and
 * check constraints are enforced by the schema and surface as
 * `StoreError::Integrity`.
 */

use log::debug;
use rusqlite::{params, OptionalExtension};

use super::connection::DatabaseConnection;
use super::models::{
    CategoryRecord, CommentRecord, GenreRecord, ReviewRecord, TitleRecord, UserRecord, UserRole,
    MAX_NAME_LENGTH,
};
use crate::errors::StoreError;
use crate::validation::{
    validate_email, validate_length, validate_score, validate_slug, validate_username,
    validate_year,
};

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self, StoreError> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Access the underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // User Operations
    // =========================================================================

    /// Create a new user account
    ///
    /// Username and email are validated before the write; duplicates are
    /// rejected by the unique constraints.
    pub async fn create_user(&self, user: &UserRecord) -> Result<i64, StoreError> {
        validate_username(&user.username)?;
        validate_email(&user.email)?;

        let user = user.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO users (
                        username, email, first_name, last_name, role, bio,
                        confirmation_code, date_joined
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                    params![
                        user.username,
                        user.email,
                        user.first_name,
                        user.last_name,
                        user.role.to_string(),
                        user.bio,
                        user.confirmation_code,
                        user.date_joined,
                    ],
                )
                .map_err(StoreError::from_sqlite)?;

                Ok(conn.last_insert_rowid())
            })
            .await
    }

    /// Get a user by database ID
    pub async fn get_user(&self, user_id: i64) -> Result<Option<UserRecord>, StoreError> {
        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        &format!("{} WHERE id = ?1", SELECT_USER),
                        [user_id],
                        map_user_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// Get a user by username
    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let username = username.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        &format!("{} WHERE username = ?1", SELECT_USER),
                        [username],
                        map_user_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// Get a user by email address
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let email = email.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        &format!("{} WHERE email = ?1", SELECT_USER),
                        [email],
                        map_user_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// List all users ordered by username
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare(&format!("{} ORDER BY username", SELECT_USER))?;
                let users = stmt
                    .query_map([], map_user_row)?
                    .filter_map(|r| r.ok())
                    .collect();
                Ok(users)
            })
            .await
    }

    /// Change a user's role
    pub async fn update_user_role(&self, user_id: i64, role: UserRole) -> Result<(), StoreError> {
        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    "UPDATE users SET role = ?1 WHERE id = ?2",
                    params![role.to_string(), user_id],
                )?;
                if updated == 0 {
                    return Err(StoreError::NotFound {
                        entity: "user",
                        key: user_id.to_string(),
                    });
                }
                Ok(())
            })
            .await
    }

    /// Update a user's profile fields
    pub async fn update_user_profile(
        &self,
        user_id: i64,
        first_name: &str,
        last_name: &str,
        bio: &str,
    ) -> Result<(), StoreError> {
        let first_name = first_name.to_string();
        let last_name = last_name.to_string();
        let bio = bio.to_string();

        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    "UPDATE users SET first_name = ?1, last_name = ?2, bio = ?3 WHERE id = ?4",
                    params![first_name, last_name, bio, user_id],
                )?;
                if updated == 0 {
                    return Err(StoreError::NotFound {
                        entity: "user",
                        key: user_id.to_string(),
                    });
                }
                Ok(())
            })
            .await
    }

    /// Issue a fresh confirmation code for a user and return it
    ///
    /// The code is an opaque token consumed by the out-of-band
    /// email-confirmation flow; issuing a new one replaces any
    /// outstanding code.
    pub async fn issue_confirmation_code(&self, user_id: i64) -> Result<String, StoreError> {
        let code = uuid::Uuid::new_v4().simple().to_string();
        let stored = code.clone();

        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    "UPDATE users SET confirmation_code = ?1 WHERE id = ?2",
                    params![stored, user_id],
                )?;
                if updated == 0 {
                    return Err(StoreError::NotFound {
                        entity: "user",
                        key: user_id.to_string(),
                    });
                }
                Ok(())
            })
            .await?;

        debug!("Issued confirmation code for user {}", user_id);
        Ok(code)
    }

    /// Confirm a user's email with the code they received
    ///
    /// Returns true and clears the stored code on a match; returns false
    /// if the code does not match or none is outstanding.
    pub async fn confirm_email(&self, user_id: i64, code: &str) -> Result<bool, StoreError> {
        let code = code.to_string();

        self.db
            .execute_async(move |conn| {
                let stored: Option<Option<String>> = conn
                    .query_row(
                        "SELECT confirmation_code FROM users WHERE id = ?1",
                        [user_id],
                        |row| row.get(0),
                    )
                    .optional()?;

                let stored = stored.ok_or_else(|| StoreError::NotFound {
                    entity: "user",
                    key: user_id.to_string(),
                })?;

                if stored.as_deref() == Some(code.as_str()) {
                    conn.execute(
                        "UPDATE users SET confirmation_code = NULL WHERE id = ?1",
                        [user_id],
                    )?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            })
            .await
    }

    /// Delete a user and, through cascades, their reviews and comments
    pub async fn delete_user(&self, user_id: i64) -> Result<bool, StoreError> {
        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM users WHERE id = ?1", [user_id])?;
                Ok(deleted > 0)
            })
            .await
    }

    // =========================================================================
    // Category Operations
    // =========================================================================

    /// Create a new category
    pub async fn create_category(&self, category: &CategoryRecord) -> Result<i64, StoreError> {
        validate_length("name", &category.name, MAX_NAME_LENGTH)?;
        validate_slug(&category.slug)?;

        let category = category.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "INSERT INTO categories (name, slug) VALUES (?1, ?2)",
                    params![category.name, category.slug],
                )
                .map_err(StoreError::from_sqlite)?;

                Ok(conn.last_insert_rowid())
            })
            .await
    }

    /// Get a category by its slug
    pub async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, StoreError> {
        let slug = slug.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        "SELECT id, name, slug FROM categories WHERE slug = ?1",
                        [slug],
                        map_category_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// List all categories ordered by slug
    pub async fn list_categories(&self) -> Result<Vec<CategoryRecord>, StoreError> {
        self.db
            .execute_async(|conn| {
                let mut stmt =
                    conn.prepare("SELECT id, name, slug FROM categories ORDER BY slug")?;
                let categories = stmt
                    .query_map([], map_category_row)?
                    .filter_map(|r| r.ok())
                    .collect();
                Ok(categories)
            })
            .await
    }

    /// Delete a category by slug
    ///
    /// Titles in the category are kept; their category reference is
    /// cleared by the ON DELETE SET NULL rule.
    pub async fn delete_category(&self, slug: &str) -> Result<bool, StoreError> {
        let slug = slug.to_string();

        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM categories WHERE slug = ?1", [slug])?;
                Ok(deleted > 0)
            })
            .await
    }

    // =========================================================================
    // Genre Operations
    // =========================================================================

    /// Create a new genre
    pub async fn create_genre(&self, genre: &GenreRecord) -> Result<i64, StoreError> {
        validate_length("name", &genre.name, MAX_NAME_LENGTH)?;
        validate_slug(&genre.slug)?;

        let genre = genre.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "INSERT INTO genres (name, slug) VALUES (?1, ?2)",
                    params![genre.name, genre.slug],
                )
                .map_err(StoreError::from_sqlite)?;

                Ok(conn.last_insert_rowid())
            })
            .await
    }

    /// Get a genre by its slug
    pub async fn get_genre_by_slug(&self, slug: &str) -> Result<Option<GenreRecord>, StoreError> {
        let slug = slug.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        "SELECT id, name, slug FROM genres WHERE slug = ?1",
                        [slug],
                        map_genre_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// List all genres ordered by slug
    pub async fn list_genres(&self) -> Result<Vec<GenreRecord>, StoreError> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare("SELECT id, name, slug FROM genres ORDER BY slug")?;
                let genres = stmt
                    .query_map([], map_genre_row)?
                    .filter_map(|r| r.ok())
                    .collect();
                Ok(genres)
            })
            .await
    }

    /// Delete a genre by slug; join rows to titles are removed by cascade
    pub async fn delete_genre(&self, slug: &str) -> Result<bool, StoreError> {
        let slug = slug.to_string();

        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM genres WHERE slug = ?1", [slug])?;
                Ok(deleted > 0)
            })
            .await
    }

    // =========================================================================
    // Title Operations
    // =========================================================================

    /// Create a new title, linking it to genres by slug in one transaction
    pub async fn create_title(
        &self,
        title: &TitleRecord,
        genre_slugs: &[String],
    ) -> Result<i64, StoreError> {
        validate_length("name", &title.name, MAX_NAME_LENGTH)?;
        validate_year(title.year)?;

        let title = title.clone();
        let genre_slugs = genre_slugs.to_vec();

        self.db
            .transaction_async(move |tx| {
                tx.execute(
                    "INSERT INTO titles (name, year, description, category_id) VALUES (?1, ?2, ?3, ?4)",
                    params![title.name, title.year, title.description, title.category_id],
                )
                .map_err(StoreError::from_sqlite)?;

                let title_id = tx.last_insert_rowid();
                link_genres(tx, title_id, &genre_slugs)?;

                Ok(title_id)
            })
            .await
    }

    /// Get a title with its genres
    pub async fn get_title(
        &self,
        title_id: i64,
    ) -> Result<Option<(TitleRecord, Vec<GenreRecord>)>, StoreError> {
        self.db
            .execute_async(move |conn| {
                let title = conn
                    .query_row(
                        "SELECT id, name, year, description, category_id FROM titles WHERE id = ?1",
                        [title_id],
                        map_title_row,
                    )
                    .optional()?;

                let Some(title) = title else {
                    return Ok(None);
                };

                let mut stmt = conn.prepare(
                    r#"
                    SELECT g.id, g.name, g.slug
                    FROM genres g
                    INNER JOIN title_genres tg ON g.id = tg.genre_id
                    WHERE tg.title_id = ?1
                    ORDER BY g.slug
                    "#,
                )?;
                let genres = stmt
                    .query_map([title_id], map_genre_row)?
                    .filter_map(|r| r.ok())
                    .collect();

                Ok(Some((title, genres)))
            })
            .await
    }

    /// List all titles ordered by name
    pub async fn list_titles(&self) -> Result<Vec<TitleRecord>, StoreError> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, year, description, category_id FROM titles ORDER BY name",
                )?;
                let titles = stmt
                    .query_map([], map_title_row)?
                    .filter_map(|r| r.ok())
                    .collect();
                Ok(titles)
            })
            .await
    }

    /// List titles belonging to a category
    pub async fn list_titles_by_category(
        &self,
        category_slug: &str,
    ) -> Result<Vec<TitleRecord>, StoreError> {
        let category_slug = category_slug.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT t.id, t.name, t.year, t.description, t.category_id
                    FROM titles t
                    INNER JOIN categories c ON t.category_id = c.id
                    WHERE c.slug = ?1
                    ORDER BY t.name
                    "#,
                )?;
                let titles = stmt
                    .query_map([category_slug], map_title_row)?
                    .filter_map(|r| r.ok())
                    .collect();
                Ok(titles)
            })
            .await
    }

    /// List titles carrying a genre
    pub async fn list_titles_by_genre(
        &self,
        genre_slug: &str,
    ) -> Result<Vec<TitleRecord>, StoreError> {
        let genre_slug = genre_slug.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT t.id, t.name, t.year, t.description, t.category_id
                    FROM titles t
                    INNER JOIN title_genres tg ON t.id = tg.title_id
                    INNER JOIN genres g ON tg.genre_id = g.id
                    WHERE g.slug = ?1
                    ORDER BY t.name
                    "#,
                )?;
                let titles = stmt
                    .query_map([genre_slug], map_title_row)?
                    .filter_map(|r| r.ok())
                    .collect();
                Ok(titles)
            })
            .await
    }

    /// Update a title's fields
    pub async fn update_title(&self, title: &TitleRecord) -> Result<(), StoreError> {
        validate_length("name", &title.name, MAX_NAME_LENGTH)?;
        validate_year(title.year)?;

        let title = title.clone();

        self.db
            .execute_async(move |conn| {
                let updated = conn
                    .execute(
                        "UPDATE titles SET name = ?1, year = ?2, description = ?3, category_id = ?4 WHERE id = ?5",
                        params![title.name, title.year, title.description, title.category_id, title.id],
                    )
                    .map_err(StoreError::from_sqlite)?;
                if updated == 0 {
                    return Err(StoreError::NotFound {
                        entity: "title",
                        key: title.id.to_string(),
                    });
                }
                Ok(())
            })
            .await
    }

    /// Replace a title's genre links with the given slugs
    pub async fn set_title_genres(
        &self,
        title_id: i64,
        genre_slugs: &[String],
    ) -> Result<(), StoreError> {
        let genre_slugs = genre_slugs.to_vec();

        self.db
            .transaction_async(move |tx| {
                tx.execute("DELETE FROM title_genres WHERE title_id = ?1", [title_id])?;
                link_genres(tx, title_id, &genre_slugs)?;
                Ok(())
            })
            .await
    }

    /// Average review score for a title, None when it has no reviews
    pub async fn title_rating(&self, title_id: i64) -> Result<Option<f64>, StoreError> {
        self.db
            .execute_async(move |conn| {
                let rating: Option<f64> = conn.query_row(
                    "SELECT AVG(score) FROM reviews WHERE title_id = ?1",
                    [title_id],
                    |row| row.get(0),
                )?;
                Ok(rating)
            })
            .await
    }

    /// Delete a title and, through cascades, its reviews and their comments
    pub async fn delete_title(&self, title_id: i64) -> Result<bool, StoreError> {
        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM titles WHERE id = ?1", [title_id])?;
                Ok(deleted > 0)
            })
            .await
    }

    // =========================================================================
    // Review Operations
    // =========================================================================

    /// Create a new review
    ///
    /// The score is validated up front; a second review by the same author
    /// for the same title violates the unique constraint and surfaces as
    /// an integrity error.
    pub async fn create_review(&self, review: &ReviewRecord) -> Result<i64, StoreError> {
        validate_score(review.score)?;

        let review = review.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO reviews (title_id, author_id, text, score, pub_date)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        review.title_id,
                        review.author_id,
                        review.text,
                        review.score,
                        review.pub_date,
                    ],
                )
                .map_err(StoreError::from_sqlite)?;

                Ok(conn.last_insert_rowid())
            })
            .await
    }

    /// Get a review by database ID
    pub async fn get_review(&self, review_id: i64) -> Result<Option<ReviewRecord>, StoreError> {
        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        "SELECT id, title_id, author_id, text, score, pub_date FROM reviews WHERE id = ?1",
                        [review_id],
                        map_review_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// List reviews for a title in publication order
    pub async fn list_reviews_for_title(
        &self,
        title_id: i64,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, title_id, author_id, text, score, pub_date
                    FROM reviews
                    WHERE title_id = ?1
                    ORDER BY pub_date
                    "#,
                )?;
                let reviews = stmt
                    .query_map([title_id], map_review_row)?
                    .filter_map(|r| r.ok())
                    .collect();
                Ok(reviews)
            })
            .await
    }

    /// Edit a review's text; score and pub_date stay untouched
    pub async fn update_review_text(&self, review_id: i64, text: &str) -> Result<(), StoreError> {
        let text = text.to_string();

        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    "UPDATE reviews SET text = ?1 WHERE id = ?2",
                    params![text, review_id],
                )?;
                if updated == 0 {
                    return Err(StoreError::NotFound {
                        entity: "review",
                        key: review_id.to_string(),
                    });
                }
                Ok(())
            })
            .await
    }

    /// Delete a review and, through the cascade, its comments
    pub async fn delete_review(&self, review_id: i64) -> Result<bool, StoreError> {
        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM reviews WHERE id = ?1", [review_id])?;
                Ok(deleted > 0)
            })
            .await
    }

    // =========================================================================
    // Comment Operations
    // =========================================================================

    /// Create a new comment on a review
    pub async fn create_comment(&self, comment: &CommentRecord) -> Result<i64, StoreError> {
        let comment = comment.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO comments (review_id, author_id, text, pub_date)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                    params![
                        comment.review_id,
                        comment.author_id,
                        comment.text,
                        comment.pub_date,
                    ],
                )
                .map_err(StoreError::from_sqlite)?;

                Ok(conn.last_insert_rowid())
            })
            .await
    }

    /// Get a comment by database ID
    pub async fn get_comment(&self, comment_id: i64) -> Result<Option<CommentRecord>, StoreError> {
        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        "SELECT id, review_id, author_id, text, pub_date FROM comments WHERE id = ?1",
                        [comment_id],
                        map_comment_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// List comments for a review in publication order
    pub async fn list_comments_for_review(
        &self,
        review_id: i64,
    ) -> Result<Vec<CommentRecord>, StoreError> {
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, review_id, author_id, text, pub_date
                    FROM comments
                    WHERE review_id = ?1
                    ORDER BY pub_date
                    "#,
                )?;
                let comments = stmt
                    .query_map([review_id], map_comment_row)?
                    .filter_map(|r| r.ok())
                    .collect();
                Ok(comments)
            })
            .await
    }

    /// Edit a comment's text; pub_date stays untouched
    pub async fn update_comment_text(&self, comment_id: i64, text: &str) -> Result<(), StoreError> {
        let text = text.to_string();

        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    "UPDATE comments SET text = ?1 WHERE id = ?2",
                    params![text, comment_id],
                )?;
                if updated == 0 {
                    return Err(StoreError::NotFound {
                        entity: "comment",
                        key: comment_id.to_string(),
                    });
                }
                Ok(())
            })
            .await
    }

    /// Delete a comment
    pub async fn delete_comment(&self, comment_id: i64) -> Result<bool, StoreError> {
        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM comments WHERE id = ?1", [comment_id])?;
                Ok(deleted > 0)
            })
            .await
    }
}

/// Column list shared by all user queries
const SELECT_USER: &str = r#"
    SELECT id, username, email, first_name, last_name, role, bio,
           confirmation_code, date_joined
    FROM users
"#;

/// Resolve genre slugs and insert join rows for a title
fn link_genres(
    tx: &rusqlite::Transaction,
    title_id: i64,
    genre_slugs: &[String],
) -> Result<(), StoreError> {
    for slug in genre_slugs {
        let genre_id: Option<i64> = tx
            .query_row("SELECT id FROM genres WHERE slug = ?1", [slug], |row| {
                row.get(0)
            })
            .optional()?;

        let genre_id = genre_id.ok_or_else(|| StoreError::NotFound {
            entity: "genre",
            key: slug.clone(),
        })?;

        tx.execute(
            "INSERT OR IGNORE INTO title_genres (title_id, genre_id) VALUES (?1, ?2)",
            params![title_id, genre_id],
        )
        .map_err(StoreError::from_sqlite)?;
    }
    Ok(())
}

fn map_user_row(row: &rusqlite::Row) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        role: row
            .get::<_, String>(5)?
            .parse()
            .unwrap_or(UserRole::User),
        bio: row.get(6)?,
        confirmation_code: row.get(7)?,
        date_joined: row.get(8)?,
    })
}

fn map_category_row(row: &rusqlite::Row) -> rusqlite::Result<CategoryRecord> {
    Ok(CategoryRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
    })
}

fn map_genre_row(row: &rusqlite::Row) -> rusqlite::Result<GenreRecord> {
    Ok(GenreRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
    })
}

fn map_title_row(row: &rusqlite::Row) -> rusqlite::Result<TitleRecord> {
    Ok(TitleRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        year: row.get(2)?,
        description: row.get(3)?,
        category_id: row.get(4)?,
    })
}

fn map_review_row(row: &rusqlite::Row) -> rusqlite::Result<ReviewRecord> {
    Ok(ReviewRecord {
        id: row.get(0)?,
        title_id: row.get(1)?,
        author_id: row.get(2)?,
        text: row.get(3)?,
        score: row.get(4)?,
        pub_date: row.get(5)?,
    })
}

fn map_comment_row(row: &rusqlite::Row) -> rusqlite::Result<CommentRecord> {
    Ok(CommentRecord {
        id: row.get(0)?,
        review_id: row.get(1)?,
        author_id: row.get(2)?,
        text: row.get(3)?,
        pub_date: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ValidationError;

    fn create_test_repo() -> Repository {
        Repository::new_in_memory().expect("Failed to create test repository")
    }

    async fn seed_user(repo: &Repository, username: &str) -> i64 {
        let user = UserRecord::new(
            username.to_string(),
            format!("{}@example.com", username),
        );
        repo.create_user(&user).await.expect("Failed to create user")
    }

    async fn seed_title(repo: &Repository, name: &str) -> i64 {
        let title = TitleRecord::new(name.to_string(), 1999);
        repo.create_title(&title, &[]).await.expect("Failed to create title")
    }

    async fn seed_review(repo: &Repository, title_id: i64, author_id: i64, score: i64) -> i64 {
        let review = ReviewRecord::new(title_id, author_id, "A review".to_string(), score);
        repo.create_review(&review).await.expect("Failed to create review")
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_createUser_shouldRoundTrip() {
        let repo = create_test_repo();

        let user = UserRecord::new("critic".to_string(), "critic@example.com".to_string());
        let id = repo.create_user(&user).await.expect("Failed to create user");

        let retrieved = repo
            .get_user(id)
            .await
            .expect("Failed to get user")
            .expect("User should exist");

        assert_eq!(retrieved.username, "critic");
        assert_eq!(retrieved.email, "critic@example.com");
        assert_eq!(retrieved.role, UserRole::User);
        assert!(retrieved.confirmation_code.is_none());
    }

    #[tokio::test]
    async fn test_createUser_withReservedUsername_shouldFailValidation() {
        let repo = create_test_repo();

        let user = UserRecord::new("me".to_string(), "me@example.com".to_string());
        let result = repo.create_user(&user).await;

        assert!(matches!(
            result,
            Err(StoreError::Validation(ValidationError::Reserved { .. }))
        ));
    }

    #[tokio::test]
    async fn test_createUser_withDuplicateUsername_shouldFailIntegrity() {
        let repo = create_test_repo();

        seed_user(&repo, "critic").await;

        let duplicate = UserRecord::new("critic".to_string(), "other@example.com".to_string());
        let result = repo.create_user(&duplicate).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().is_integrity());
    }

    #[tokio::test]
    async fn test_createUser_withDuplicateEmail_shouldFailIntegrity() {
        let repo = create_test_repo();

        let first = UserRecord::new("first".to_string(), "shared@example.com".to_string());
        repo.create_user(&first).await.unwrap();

        let second = UserRecord::new("second".to_string(), "shared@example.com".to_string());
        let result = repo.create_user(&second).await;

        assert!(result.unwrap_err().is_integrity());
    }

    #[tokio::test]
    async fn test_updateUserRole_shouldPersistNewRole() {
        let repo = create_test_repo();
        let id = seed_user(&repo, "promoted").await;

        repo.update_user_role(id, UserRole::Moderator).await.unwrap();

        let user = repo.get_user(id).await.unwrap().unwrap();
        assert_eq!(user.role, UserRole::Moderator);
        assert!(user.role.can_moderate());
    }

    #[tokio::test]
    async fn test_updateUserRole_withMissingUser_shouldReturnNotFound() {
        let repo = create_test_repo();

        let result = repo.update_user_role(12345, UserRole::Admin).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_confirmationFlow_shouldClearCodeOnMatch() {
        let repo = create_test_repo();
        let id = seed_user(&repo, "pending").await;

        let code = repo.issue_confirmation_code(id).await.unwrap();

        // Wrong code leaves the stored one in place
        let confirmed = repo.confirm_email(id, "wrong-code").await.unwrap();
        assert!(!confirmed);

        let confirmed = repo.confirm_email(id, &code).await.unwrap();
        assert!(confirmed);

        let user = repo.get_user(id).await.unwrap().unwrap();
        assert!(user.confirmation_code.is_none());

        // Code is single-use
        let confirmed = repo.confirm_email(id, &code).await.unwrap();
        assert!(!confirmed);
    }

    #[tokio::test]
    async fn test_getUserByUsername_shouldFindUser() {
        let repo = create_test_repo();
        seed_user(&repo, "findme").await;

        let found = repo.get_user_by_username("findme").await.unwrap();
        assert!(found.is_some());

        let missing = repo.get_user_by_username("ghost").await.unwrap();
        assert!(missing.is_none());
    }

    // -------------------------------------------------------------------------
    // Categories and genres
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_createCategory_shouldRoundTrip() {
        let repo = create_test_repo();

        let category = CategoryRecord::new("Movies".to_string(), "movies".to_string());
        repo.create_category(&category).await.unwrap();

        let retrieved = repo
            .get_category_by_slug("movies")
            .await
            .unwrap()
            .expect("Category should exist");
        assert_eq!(retrieved.name, "Movies");
    }

    #[tokio::test]
    async fn test_createCategory_withDuplicateSlug_shouldFailIntegrity() {
        let repo = create_test_repo();

        let category = CategoryRecord::new("Movies".to_string(), "movies".to_string());
        repo.create_category(&category).await.unwrap();

        let duplicate = CategoryRecord::new("Films".to_string(), "movies".to_string());
        let result = repo.create_category(&duplicate).await;

        assert!(result.unwrap_err().is_integrity());
    }

    #[tokio::test]
    async fn test_createCategory_withBadSlug_shouldFailValidation() {
        let repo = create_test_repo();

        let category = CategoryRecord::new("Movies".to_string(), "not a slug".to_string());
        let result = repo.create_category(&category).await;

        assert!(matches!(
            result,
            Err(StoreError::Validation(ValidationError::InvalidFormat { .. }))
        ));
    }

    #[tokio::test]
    async fn test_listGenres_shouldOrderBySlug() {
        let repo = create_test_repo();

        repo.create_genre(&GenreRecord::new("Thriller".to_string(), "thriller".to_string()))
            .await
            .unwrap();
        repo.create_genre(&GenreRecord::new("Drama".to_string(), "drama".to_string()))
            .await
            .unwrap();

        let genres = repo.list_genres().await.unwrap();
        assert_eq!(genres.len(), 2);
        assert_eq!(genres[0].slug, "drama");
        assert_eq!(genres[1].slug, "thriller");
    }

    // -------------------------------------------------------------------------
    // Titles
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_createTitle_withGenres_shouldLinkThem() {
        let repo = create_test_repo();

        repo.create_genre(&GenreRecord::new("Drama".to_string(), "drama".to_string()))
            .await
            .unwrap();
        repo.create_genre(&GenreRecord::new("Crime".to_string(), "crime".to_string()))
            .await
            .unwrap();

        let title = TitleRecord::new("Heat".to_string(), 1995);
        let id = repo
            .create_title(&title, &["drama".to_string(), "crime".to_string()])
            .await
            .unwrap();

        let (retrieved, genres) = repo.get_title(id).await.unwrap().unwrap();
        assert_eq!(retrieved.name, "Heat");
        assert_eq!(genres.len(), 2);
        assert_eq!(genres[0].slug, "crime");
        assert_eq!(genres[1].slug, "drama");
    }

    #[tokio::test]
    async fn test_createTitle_withUnknownGenre_shouldRollBack() {
        let repo = create_test_repo();

        let title = TitleRecord::new("Orphaned".to_string(), 2001);
        let result = repo.create_title(&title, &["no-such-genre".to_string()]).await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));

        // The failed transaction must not leave the title behind
        let titles = repo.list_titles().await.unwrap();
        assert!(titles.is_empty());
    }

    #[tokio::test]
    async fn test_createTitle_withFutureYear_shouldFailValidation() {
        let repo = create_test_repo();

        let next_year = chrono::Datelike::year(&chrono::Utc::now()) + 1;
        let title = TitleRecord::new("From The Future".to_string(), next_year);
        let result = repo.create_title(&title, &[]).await;

        assert!(matches!(
            result,
            Err(StoreError::Validation(ValidationError::YearInFuture { .. }))
        ));
    }

    #[tokio::test]
    async fn test_setTitleGenres_shouldReplaceLinks() {
        let repo = create_test_repo();

        repo.create_genre(&GenreRecord::new("Drama".to_string(), "drama".to_string()))
            .await
            .unwrap();
        repo.create_genre(&GenreRecord::new("Comedy".to_string(), "comedy".to_string()))
            .await
            .unwrap();

        let title = TitleRecord::new("Mixed".to_string(), 2010);
        let id = repo.create_title(&title, &["drama".to_string()]).await.unwrap();

        repo.set_title_genres(id, &["comedy".to_string()]).await.unwrap();

        let (_, genres) = repo.get_title(id).await.unwrap().unwrap();
        assert_eq!(genres.len(), 1);
        assert_eq!(genres[0].slug, "comedy");
    }

    #[tokio::test]
    async fn test_listTitlesByCategory_shouldFilter() {
        let repo = create_test_repo();

        let movies = CategoryRecord::new("Movies".to_string(), "movies".to_string());
        let movies_id = repo.create_category(&movies).await.unwrap();

        let mut filmed = TitleRecord::new("Filmed".to_string(), 1990);
        filmed.category_id = Some(movies_id);
        repo.create_title(&filmed, &[]).await.unwrap();

        let uncategorized = TitleRecord::new("Loose".to_string(), 1991);
        repo.create_title(&uncategorized, &[]).await.unwrap();

        let in_movies = repo.list_titles_by_category("movies").await.unwrap();
        assert_eq!(in_movies.len(), 1);
        assert_eq!(in_movies[0].name, "Filmed");
    }

    #[tokio::test]
    async fn test_deleteCategory_shouldLeaveTitleWithoutCategory() {
        let repo = create_test_repo();

        let category = CategoryRecord::new("Movies".to_string(), "movies".to_string());
        let category_id = repo.create_category(&category).await.unwrap();

        let mut title = TitleRecord::new("Survivor".to_string(), 2000);
        title.category_id = Some(category_id);
        let title_id = repo.create_title(&title, &[]).await.unwrap();

        let deleted = repo.delete_category("movies").await.unwrap();
        assert!(deleted);

        // The title survives with its category reference cleared
        let (survivor, _) = repo.get_title(title_id).await.unwrap().unwrap();
        assert_eq!(survivor.category_id, None);
    }

    #[tokio::test]
    async fn test_titleRating_shouldAverageScores() {
        let repo = create_test_repo();

        let title_id = seed_title(&repo, "Rated").await;
        let alice = seed_user(&repo, "alice").await;
        let bob = seed_user(&repo, "bob").await;

        assert_eq!(repo.title_rating(title_id).await.unwrap(), None);

        seed_review(&repo, title_id, alice, 6).await;
        seed_review(&repo, title_id, bob, 9).await;

        let rating = repo.title_rating(title_id).await.unwrap();
        assert_eq!(rating, Some(7.5));
    }

    // -------------------------------------------------------------------------
    // Reviews
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_createReview_withBoundaryScores_shouldSucceed() {
        let repo = create_test_repo();

        let title_id = seed_title(&repo, "Scored").await;
        let alice = seed_user(&repo, "alice").await;
        let bob = seed_user(&repo, "bob").await;

        seed_review(&repo, title_id, alice, 1).await;
        seed_review(&repo, title_id, bob, 10).await;

        let reviews = repo.list_reviews_for_title(title_id).await.unwrap();
        assert_eq!(reviews.len(), 2);
    }

    #[tokio::test]
    async fn test_createReview_withOutOfRangeScore_shouldFailValidation() {
        let repo = create_test_repo();

        let title_id = seed_title(&repo, "Scored").await;
        let author_id = seed_user(&repo, "alice").await;

        for score in [0, 11] {
            let review = ReviewRecord::new(title_id, author_id, "Bad score".to_string(), score);
            let result = repo.create_review(&review).await;
            assert!(matches!(
                result,
                Err(StoreError::Validation(ValidationError::ScoreOutOfRange { .. }))
            ));
        }
    }

    #[tokio::test]
    async fn test_createReview_secondForSamePair_shouldFailIntegrity() {
        let repo = create_test_repo();

        let title_id = seed_title(&repo, "Reviewed Once").await;
        let author_id = seed_user(&repo, "alice").await;

        seed_review(&repo, title_id, author_id, 7).await;

        let second = ReviewRecord::new(title_id, author_id, "Changed my mind".to_string(), 3);
        let result = repo.create_review(&second).await;

        assert!(result.unwrap_err().is_integrity());
    }

    #[tokio::test]
    async fn test_createReview_sameAuthorDifferentTitles_shouldSucceed() {
        let repo = create_test_repo();

        let first = seed_title(&repo, "First").await;
        let second = seed_title(&repo, "Second").await;
        let author_id = seed_user(&repo, "alice").await;

        seed_review(&repo, first, author_id, 7).await;
        seed_review(&repo, second, author_id, 8).await;
    }

    #[tokio::test]
    async fn test_updateReviewText_shouldKeepScoreAndPubDate() {
        let repo = create_test_repo();

        let title_id = seed_title(&repo, "Edited").await;
        let author_id = seed_user(&repo, "alice").await;
        let review_id = seed_review(&repo, title_id, author_id, 7).await;

        let before = repo.get_review(review_id).await.unwrap().unwrap();

        repo.update_review_text(review_id, "Second thoughts").await.unwrap();

        let after = repo.get_review(review_id).await.unwrap().unwrap();
        assert_eq!(after.text, "Second thoughts");
        assert_eq!(after.score, before.score);
        assert_eq!(after.pub_date, before.pub_date);
    }

    #[tokio::test]
    async fn test_deleteTitle_shouldCascadeToReviewsAndComments() {
        let repo = create_test_repo();

        let title_id = seed_title(&repo, "Doomed").await;
        let author_id = seed_user(&repo, "alice").await;
        let review_id = seed_review(&repo, title_id, author_id, 5).await;

        let comment = CommentRecord::new(review_id, Some(author_id), "I agree".to_string());
        let comment_id = repo.create_comment(&comment).await.unwrap();

        repo.delete_title(title_id).await.unwrap();

        assert!(repo.get_review(review_id).await.unwrap().is_none());
        assert!(repo.get_comment(comment_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleteUser_shouldCascadeToTheirReviews() {
        let repo = create_test_repo();

        let title_id = seed_title(&repo, "Kept").await;
        let author_id = seed_user(&repo, "leaving").await;
        let review_id = seed_review(&repo, title_id, author_id, 5).await;

        repo.delete_user(author_id).await.unwrap();

        assert!(repo.get_review(review_id).await.unwrap().is_none());
        // The title itself is untouched
        assert!(repo.get_title(title_id).await.unwrap().is_some());
    }

    // -------------------------------------------------------------------------
    // Comments
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_createComment_withoutAuthor_shouldSucceed() {
        let repo = create_test_repo();

        let title_id = seed_title(&repo, "Commented").await;
        let author_id = seed_user(&repo, "alice").await;
        let review_id = seed_review(&repo, title_id, author_id, 5).await;

        let comment = CommentRecord::new(review_id, None, "Anonymous remark".to_string());
        let comment_id = repo.create_comment(&comment).await.unwrap();

        let retrieved = repo.get_comment(comment_id).await.unwrap().unwrap();
        assert_eq!(retrieved.author_id, None);
        assert_eq!(retrieved.text, "Anonymous remark");
    }

    #[tokio::test]
    async fn test_createComment_onMissingReview_shouldFailIntegrity() {
        let repo = create_test_repo();

        let comment = CommentRecord::new(999, None, "Into the void".to_string());
        let result = repo.create_comment(&comment).await;

        assert!(result.unwrap_err().is_integrity());
    }

    #[tokio::test]
    async fn test_deleteReview_shouldCascadeToComments() {
        let repo = create_test_repo();

        let title_id = seed_title(&repo, "Commented").await;
        let author_id = seed_user(&repo, "alice").await;
        let review_id = seed_review(&repo, title_id, author_id, 5).await;

        let comment = CommentRecord::new(review_id, Some(author_id), "First!".to_string());
        repo.create_comment(&comment).await.unwrap();

        repo.delete_review(review_id).await.unwrap();

        let comments = repo.list_comments_for_review(review_id).await.unwrap();
        assert!(comments.is_empty());
    }

    #[tokio::test]
    async fn test_updateCommentText_shouldKeepPubDate() {
        let repo = create_test_repo();

        let title_id = seed_title(&repo, "Commented").await;
        let author_id = seed_user(&repo, "alice").await;
        let review_id = seed_review(&repo, title_id, author_id, 5).await;

        let comment = CommentRecord::new(review_id, Some(author_id), "Typo".to_string());
        let comment_id = repo.create_comment(&comment).await.unwrap();

        let before = repo.get_comment(comment_id).await.unwrap().unwrap();
        repo.update_comment_text(comment_id, "Fixed").await.unwrap();
        let after = repo.get_comment(comment_id).await.unwrap().unwrap();

        assert_eq!(after.text, "Fixed");
        assert_eq!(after.pub_date, before.pub_date);
    }
}
