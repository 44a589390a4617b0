//! Shared `SQLite` store.
//!
//! All repositories operate on one pool owned by [`Store`], so the service
//! layer can span users, messages, notifications, and history in a single
//! transaction.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::Result;
use crate::history::HistoryRepository;
use crate::message::MessageRepository;
use crate::notification::NotificationRepository;
use crate::user::UserRepository;

/// Handle to the message store.
///
/// Cheap to clone; all clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) a store at the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn open(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id INTEGER NOT NULL REFERENCES users(id),
                receiver_id INTEGER NOT NULL REFERENCES users(id),
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                edited INTEGER NOT NULL DEFAULT 0,
                edited_at TEXT,
                parent_id INTEGER REFERENCES messages(id),
                is_read INTEGER NOT NULL DEFAULT 0,
                read_at TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                message_id INTEGER NOT NULL REFERENCES messages(id),
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, message_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS message_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id INTEGER NOT NULL REFERENCES messages(id),
                old_content TEXT NOT NULL,
                edited_at TEXT NOT NULL,
                edited_by INTEGER REFERENCES users(id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Indexes for the common read paths (inbox, unread, threads, feeds)
        for statement in [
            r"CREATE INDEX IF NOT EXISTS idx_messages_receiver ON messages(receiver_id, timestamp)",
            r"CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender_id, timestamp)",
            r"CREATE INDEX IF NOT EXISTS idx_messages_parent ON messages(parent_id, timestamp)",
            r"CREATE INDEX IF NOT EXISTS idx_messages_unread ON messages(receiver_id, is_read)",
            r"CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at)",
            r"CREATE INDEX IF NOT EXISTS idx_notifications_unread ON notifications(user_id, is_read)",
            r"CREATE INDEX IF NOT EXISTS idx_history_message ON message_history(message_id, edited_at)",
            r"CREATE INDEX IF NOT EXISTS idx_history_editor ON message_history(edited_by)",
        ] {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Repository for user storage and retrieval.
    #[must_use]
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Repository for message storage and retrieval.
    #[must_use]
    pub fn messages(&self) -> MessageRepository {
        MessageRepository::new(self.pool.clone())
    }

    /// Repository for notification storage and retrieval.
    #[must_use]
    pub fn notifications(&self) -> NotificationRepository {
        NotificationRepository::new(self.pool.clone())
    }

    /// Repository for message edit history.
    #[must_use]
    pub fn history(&self) -> HistoryRepository {
        HistoryRepository::new(self.pool.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_is_idempotent() {
        let store = Store::in_memory().await.unwrap();
        // A second initialization run must not fail.
        store.initialize().await.unwrap();
    }
}
