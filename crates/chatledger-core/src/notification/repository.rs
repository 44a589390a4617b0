//! Notification storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use tracing::debug;

use super::model::{Notification, NotificationId};
use crate::Result;
use crate::message::MessageId;
use crate::user::UserId;

/// Repository for notification storage and retrieval.
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get notification by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: NotificationId) -> Result<Option<Notification>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, message_id, is_read, created_at
            FROM notifications
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(row_to_notification))
    }

    /// All notifications for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn for_user(&self, user: UserId) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, message_id, is_read, created_at
            FROM notifications
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(row_to_notification).collect())
    }

    /// Unread notifications for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unread_for_user(&self, user: UserId) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, message_id, is_read, created_at
            FROM notifications
            WHERE user_id = ? AND is_read = 0
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(row_to_notification).collect())
    }

    /// Count of unread notifications for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unread_count(&self, user: UserId) -> Result<i64> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) as count
            FROM notifications
            WHERE user_id = ? AND is_read = 0
            ",
        )
        .bind(user.0)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("count"))
    }

    /// Mark a notification as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn mark_read(&self, id: NotificationId) -> Result<()> {
        sqlx::query(r"UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Mark every notification of a user as read.
    ///
    /// Returns the number of notifications that changed state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn mark_all_read(&self, user: UserId) -> Result<u64> {
        let done = sqlx::query(r"UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
            .bind(user.0)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    /// Create a notification for `user` about `message` unless one already
    /// exists, inside an open transaction.
    ///
    /// Returns `true` when a notification was created. The
    /// `UNIQUE(user_id, message_id)` constraint plus `ON CONFLICT DO NOTHING`
    /// makes this idempotent.
    pub(crate) async fn create_if_absent(
        conn: &mut SqliteConnection,
        user: UserId,
        message: MessageId,
        created_at: DateTime<Utc>,
    ) -> Result<bool> {
        let done = sqlx::query(
            r"
            INSERT INTO notifications (user_id, message_id, is_read, created_at)
            VALUES (?, ?, 0, ?)
            ON CONFLICT(user_id, message_id) DO NOTHING
            ",
        )
        .bind(user.0)
        .bind(message.0)
        .bind(created_at.to_rfc3339())
        .execute(conn)
        .await?;

        let created = done.rows_affected() > 0;
        if created {
            debug!("notification created for user {user} about message {message}");
        }
        Ok(created)
    }
}

/// Convert a database row to a Notification.
fn row_to_notification(row: &SqliteRow) -> Option<Notification> {
    let created_at_str: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .ok()?
        .with_timezone(&Utc);

    Some(Notification {
        id: NotificationId::new(row.get("id")),
        user: UserId::new(row.get("user_id")),
        message: MessageId::new(row.get("message_id")),
        is_read: row.get::<bool, _>("is_read"),
        created_at,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Store;
    use crate::user::NewUser;

    async fn seed(store: &Store) -> (UserId, MessageId) {
        let users = store.users();
        let alice = users
            .create(&NewUser::new("alice", "alice@example.com"))
            .await
            .unwrap();
        let bob = users
            .create(&NewUser::new("bob", "bob@example.com"))
            .await
            .unwrap();

        let mut conn = store.pool().acquire().await.unwrap();
        let message = crate::message::MessageRepository::insert(
            &mut conn,
            &crate::message::NewMessage::new(alice.id, bob.id, "hi"),
            Utc::now(),
        )
        .await
        .unwrap();
        (bob.id, message.id)
    }

    #[tokio::test]
    async fn test_create_if_absent_is_idempotent() {
        let store = Store::in_memory().await.unwrap();
        let (bob, message) = seed(&store).await;

        let mut conn = store.pool().acquire().await.unwrap();
        let first =
            NotificationRepository::create_if_absent(&mut conn, bob, message, Utc::now())
                .await
                .unwrap();
        let second =
            NotificationRepository::create_if_absent(&mut conn, bob, message, Utc::now())
                .await
                .unwrap();
        drop(conn);

        assert!(first);
        assert!(!second);
        assert_eq!(store.notifications().for_user(bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unread_count_and_mark_read() {
        let store = Store::in_memory().await.unwrap();
        let (bob, message) = seed(&store).await;

        let mut conn = store.pool().acquire().await.unwrap();
        NotificationRepository::create_if_absent(&mut conn, bob, message, Utc::now())
            .await
            .unwrap();
        drop(conn);

        let notifications = store.notifications();
        assert_eq!(notifications.unread_count(bob).await.unwrap(), 1);

        let all = notifications.for_user(bob).await.unwrap();
        notifications.mark_read(all[0].id).await.unwrap();

        assert_eq!(notifications.unread_count(bob).await.unwrap(), 0);
        assert!(notifications.unread_for_user(bob).await.unwrap().is_empty());
        let read_back = notifications.get(all[0].id).await.unwrap().unwrap();
        assert!(read_back.is_read);
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let store = Store::in_memory().await.unwrap();
        let (bob, message) = seed(&store).await;

        let mut conn = store.pool().acquire().await.unwrap();
        NotificationRepository::create_if_absent(&mut conn, bob, message, Utc::now())
            .await
            .unwrap();
        drop(conn);

        let notifications = store.notifications();
        assert_eq!(notifications.mark_all_read(bob).await.unwrap(), 1);
        // Second pass has nothing left to change.
        assert_eq!(notifications.mark_all_read(bob).await.unwrap(), 0);
    }
}
