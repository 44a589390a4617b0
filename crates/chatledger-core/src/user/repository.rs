//! User storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use tracing::debug;

use super::model::{NewUser, User, UserId};
use crate::{Error, Result};

/// Repository for user storage and retrieval.
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user.
    ///
    /// The draft is assumed validated; see
    /// [`validate_new_user`](super::validate_new_user).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateUser`] when the username or email is taken,
    /// or a database error if the insert fails.
    pub async fn create(&self, draft: &NewUser) -> Result<User> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r"
            INSERT INTO users (username, email, created_at)
            VALUES (?, ?, ?)
            ",
        )
        .bind(&draft.username)
        .bind(&draft.email)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = UserId::new(done.last_insert_rowid());
                debug!("created user {} ({})", id, draft.username);
                Ok(User {
                    id,
                    username: draft.username.clone(),
                    email: draft.email.clone(),
                    created_at,
                })
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(Error::DuplicateUser(draft.username.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, username, email, created_at
            FROM users
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(row_to_user))
    }

    /// Get user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, username, email, created_at
            FROM users
            WHERE username = ?
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(row_to_user))
    }

    /// Get all users, ordered by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r"
            SELECT id, username, email, created_at
            FROM users
            ORDER BY username ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(row_to_user).collect())
    }

    /// Get a user inside an open transaction.
    pub(crate) async fn fetch(conn: &mut SqliteConnection, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, username, email, created_at
            FROM users
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(conn)
        .await?;

        Ok(row.as_ref().and_then(row_to_user))
    }

    /// Delete a user row inside an open transaction.
    ///
    /// Dependent rows are the caller's responsibility; see
    /// [`delete_user`](crate::service::delete_user) for the full cascade.
    pub(crate) async fn delete(conn: &mut SqliteConnection, id: UserId) -> Result<u64> {
        let done = sqlx::query(r"DELETE FROM users WHERE id = ?")
            .bind(id.0)
            .execute(conn)
            .await?;
        Ok(done.rows_affected())
    }
}

/// Convert a database row to a User.
fn row_to_user(row: &SqliteRow) -> Option<User> {
    let created_at_str: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .ok()?
        .with_timezone(&Utc);

    Some(User {
        id: UserId::new(row.get("id")),
        username: row.get("username"),
        email: row.get("email"),
        created_at,
    })
}
