//! Edit history storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};

use super::model::{HistoryId, MessageHistory};
use crate::Result;
use crate::message::MessageId;
use crate::user::UserId;

/// Repository for message edit history.
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All prior versions of a message, most recent edit first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn for_message(&self, message: MessageId) -> Result<Vec<MessageHistory>> {
        let rows = sqlx::query(
            r"
            SELECT id, message_id, old_content, edited_at, edited_by
            FROM message_history
            WHERE message_id = ?
            ORDER BY edited_at DESC, id DESC
            ",
        )
        .bind(message.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(row_to_history).collect())
    }

    /// History entries recorded for a given editor, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn by_editor(&self, editor: UserId) -> Result<Vec<MessageHistory>> {
        let rows = sqlx::query(
            r"
            SELECT id, message_id, old_content, edited_at, edited_by
            FROM message_history
            WHERE edited_by = ?
            ORDER BY edited_at DESC, id DESC
            ",
        )
        .bind(editor.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(row_to_history).collect())
    }

    /// Append a snapshot of the pre-edit content inside an open transaction.
    pub(crate) async fn append(
        conn: &mut SqliteConnection,
        message: MessageId,
        old_content: &str,
        edited_by: Option<UserId>,
        edited_at: DateTime<Utc>,
    ) -> Result<HistoryId> {
        let done = sqlx::query(
            r"
            INSERT INTO message_history (message_id, old_content, edited_at, edited_by)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(message.0)
        .bind(old_content)
        .bind(edited_at.to_rfc3339())
        .bind(edited_by.map(|u| u.0))
        .execute(conn)
        .await?;

        Ok(HistoryId::new(done.last_insert_rowid()))
    }

    /// Clear editor attribution for a user inside an open transaction.
    ///
    /// The rows themselves are retained.
    pub(crate) async fn clear_editor(conn: &mut SqliteConnection, editor: UserId) -> Result<u64> {
        let done = sqlx::query(r"UPDATE message_history SET edited_by = NULL WHERE edited_by = ?")
            .bind(editor.0)
            .execute(conn)
            .await?;
        Ok(done.rows_affected())
    }
}

/// Convert a database row to a MessageHistory entry.
fn row_to_history(row: &SqliteRow) -> Option<MessageHistory> {
    let edited_at_str: String = row.get("edited_at");
    let edited_at = DateTime::parse_from_rfc3339(&edited_at_str)
        .ok()?
        .with_timezone(&Utc);

    Some(MessageHistory {
        id: HistoryId::new(row.get("id")),
        message: MessageId::new(row.get("message_id")),
        old_content: row.get("old_content"),
        edited_at,
        edited_by: row.get::<Option<i64>, _>("edited_by").map(UserId::new),
    })
}
