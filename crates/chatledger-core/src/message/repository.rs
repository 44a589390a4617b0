//! Message storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};

use super::model::{Message, MessageId, NewMessage};
use crate::Result;
use crate::user::UserId;

/// Repository for message storage and retrieval.
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get message by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: MessageId) -> Result<Option<Message>> {
        let row = sqlx::query(
            r"
            SELECT id, sender_id, receiver_id, content, timestamp,
                   edited, edited_at, parent_id, is_read, read_at
            FROM messages
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(row_to_message))
    }

    /// Messages received by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn inbox(&self, user: UserId) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            r"
            SELECT id, sender_id, receiver_id, content, timestamp,
                   edited, edited_at, parent_id, is_read, read_at
            FROM messages
            WHERE receiver_id = ?
            ORDER BY timestamp DESC, id DESC
            ",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(row_to_message).collect())
    }

    /// Messages sent by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn sent(&self, user: UserId) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            r"
            SELECT id, sender_id, receiver_id, content, timestamp,
                   edited, edited_at, parent_id, is_read, read_at
            FROM messages
            WHERE sender_id = ?
            ORDER BY timestamp DESC, id DESC
            ",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(row_to_message).collect())
    }

    /// Unread messages received by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unread_for(&self, user: UserId) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            r"
            SELECT id, sender_id, receiver_id, content, timestamp,
                   edited, edited_at, parent_id, is_read, read_at
            FROM messages
            WHERE receiver_id = ? AND is_read = 0
            ORDER BY timestamp DESC, id DESC
            ",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(row_to_message).collect())
    }

    /// Top-level messages (no parent) received by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn top_level_for(&self, user: UserId) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            r"
            SELECT id, sender_id, receiver_id, content, timestamp,
                   edited, edited_at, parent_id, is_read, read_at
            FROM messages
            WHERE receiver_id = ? AND parent_id IS NULL
            ORDER BY timestamp DESC, id DESC
            ",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(row_to_message).collect())
    }

    /// Direct replies to a message, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn replies(&self, parent: MessageId) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            r"
            SELECT id, sender_id, receiver_id, content, timestamp,
                   edited, edited_at, parent_id, is_read, read_at
            FROM messages
            WHERE parent_id = ?
            ORDER BY timestamp ASC, id ASC
            ",
        )
        .bind(parent.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(row_to_message).collect())
    }

    /// All messages in a thread (the root and every nested reply),
    /// in chronological order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn thread(&self, root: MessageId) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            r"
            WITH RECURSIVE thread(id) AS (
                SELECT id FROM messages WHERE id = ?1
                UNION
                SELECT m.id FROM messages m JOIN thread t ON m.parent_id = t.id
            )
            SELECT id, sender_id, receiver_id, content, timestamp,
                   edited, edited_at, parent_id, is_read, read_at
            FROM messages
            WHERE id IN (SELECT id FROM thread)
            ORDER BY timestamp ASC, id ASC
            ",
        )
        .bind(root.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(row_to_message).collect())
    }

    /// Mark a message as read by the receiver.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn mark_read(&self, id: MessageId) -> Result<()> {
        sqlx::query(r"UPDATE messages SET is_read = 1, read_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Mark a message as unread.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn mark_unread(&self, id: MessageId) -> Result<()> {
        sqlx::query(r"UPDATE messages SET is_read = 0, read_at = NULL WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert a message inside an open transaction.
    pub(crate) async fn insert(
        conn: &mut SqliteConnection,
        draft: &NewMessage,
        timestamp: DateTime<Utc>,
    ) -> Result<Message> {
        let done = sqlx::query(
            r"
            INSERT INTO messages (sender_id, receiver_id, content, timestamp, parent_id)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(draft.sender.0)
        .bind(draft.receiver.0)
        .bind(&draft.content)
        .bind(timestamp.to_rfc3339())
        .bind(draft.parent.map(|p| p.0))
        .execute(conn)
        .await?;

        Ok(Message {
            id: MessageId::new(done.last_insert_rowid()),
            sender: draft.sender,
            receiver: draft.receiver,
            content: draft.content.clone(),
            timestamp,
            edited: false,
            edited_at: None,
            parent: draft.parent,
            is_read: false,
            read_at: None,
        })
    }

    /// Get a message inside an open transaction.
    pub(crate) async fn fetch(
        conn: &mut SqliteConnection,
        id: MessageId,
    ) -> Result<Option<Message>> {
        let row = sqlx::query(
            r"
            SELECT id, sender_id, receiver_id, content, timestamp,
                   edited, edited_at, parent_id, is_read, read_at
            FROM messages
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(conn)
        .await?;

        Ok(row.as_ref().and_then(row_to_message))
    }

    /// Overwrite content and set the edited flag inside an open transaction.
    ///
    /// The previous content must already be snapshotted; see
    /// [`edit_message`](crate::service::edit_message).
    pub(crate) async fn apply_edit(
        conn: &mut SqliteConnection,
        id: MessageId,
        content: &str,
        edited_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE messages
            SET content = ?, edited = 1, edited_at = ?
            WHERE id = ?
            ",
        )
        .bind(content)
        .bind(edited_at.to_rfc3339())
        .bind(id.0)
        .execute(conn)
        .await?;
        Ok(())
    }
}

/// Convert a database row to a Message.
fn row_to_message(row: &SqliteRow) -> Option<Message> {
    let timestamp_str: String = row.get("timestamp");
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .ok()?
        .with_timezone(&Utc);

    Some(Message {
        id: MessageId::new(row.get("id")),
        sender: UserId::new(row.get("sender_id")),
        receiver: UserId::new(row.get("receiver_id")),
        content: row.get("content"),
        timestamp,
        edited: row.get::<bool, _>("edited"),
        edited_at: parse_optional(row.get("edited_at")),
        parent: row.get::<Option<i64>, _>("parent_id").map(MessageId::new),
        is_read: row.get::<bool, _>("is_read"),
        read_at: parse_optional(row.get("read_at")),
    })
}

fn parse_optional(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Store;
    use crate::user::NewUser;

    async fn seed_users(store: &Store) -> (UserId, UserId) {
        let users = store.users();
        let alice = users
            .create(&NewUser::new("alice", "alice@example.com"))
            .await
            .unwrap();
        let bob = users
            .create(&NewUser::new("bob", "bob@example.com"))
            .await
            .unwrap();
        (alice.id, bob.id)
    }

    async fn insert(store: &Store, draft: &NewMessage) -> Message {
        let mut conn = store.pool().acquire().await.unwrap();
        MessageRepository::insert(&mut conn, draft, Utc::now())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = Store::in_memory().await.unwrap();
        let (alice, bob) = seed_users(&store).await;

        let sent = insert(&store, &NewMessage::new(alice, bob, "hello bob")).await;
        let got = store.messages().get(sent.id).await.unwrap().unwrap();

        assert_eq!(got.sender, alice);
        assert_eq!(got.receiver, bob);
        assert_eq!(got.content, "hello bob");
        assert!(!got.edited);
        assert!(got.edited_at.is_none());
        assert!(!got.is_read);
    }

    #[tokio::test]
    async fn test_inbox_newest_first() {
        let store = Store::in_memory().await.unwrap();
        let (alice, bob) = seed_users(&store).await;

        let first = insert(&store, &NewMessage::new(alice, bob, "first")).await;
        let second = insert(&store, &NewMessage::new(alice, bob, "second")).await;

        let inbox = store.messages().inbox(bob).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].id, second.id);
        assert_eq!(inbox[1].id, first.id);

        // Sender's inbox is empty; the messages are in their sent feed.
        assert!(store.messages().inbox(alice).await.unwrap().is_empty());
        assert_eq!(store.messages().sent(alice).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mark_read_and_unread_filter() {
        let store = Store::in_memory().await.unwrap();
        let (alice, bob) = seed_users(&store).await;

        let msg = insert(&store, &NewMessage::new(alice, bob, "unread")).await;
        insert(&store, &NewMessage::new(alice, bob, "also unread")).await;

        let messages = store.messages();
        assert_eq!(messages.unread_for(bob).await.unwrap().len(), 2);

        messages.mark_read(msg.id).await.unwrap();
        let unread = messages.unread_for(bob).await.unwrap();
        assert_eq!(unread.len(), 1);

        let read_back = messages.get(msg.id).await.unwrap().unwrap();
        assert!(read_back.is_read);
        assert!(read_back.read_at.is_some());

        messages.mark_unread(msg.id).await.unwrap();
        let read_back = messages.get(msg.id).await.unwrap().unwrap();
        assert!(!read_back.is_read);
        assert!(read_back.read_at.is_none());
    }

    #[tokio::test]
    async fn test_thread_collects_nested_replies() {
        let store = Store::in_memory().await.unwrap();
        let (alice, bob) = seed_users(&store).await;

        let root = insert(&store, &NewMessage::new(alice, bob, "root")).await;
        let reply = insert(
            &store,
            &NewMessage::new(bob, alice, "reply").with_parent(root.id),
        )
        .await;
        let nested = insert(
            &store,
            &NewMessage::new(alice, bob, "nested").with_parent(reply.id),
        )
        .await;
        // Unrelated message must not appear in the thread.
        insert(&store, &NewMessage::new(alice, bob, "other")).await;

        let thread = store.messages().thread(root.id).await.unwrap();
        let ids: Vec<MessageId> = thread.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![root.id, reply.id, nested.id]);

        let direct = store.messages().replies(root.id).await.unwrap();
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].id, reply.id);
    }

    #[tokio::test]
    async fn test_top_level_excludes_replies() {
        let store = Store::in_memory().await.unwrap();
        let (alice, bob) = seed_users(&store).await;

        let root = insert(&store, &NewMessage::new(alice, bob, "root")).await;
        insert(
            &store,
            &NewMessage::new(alice, bob, "reply").with_parent(root.id),
        )
        .await;

        let top = store.messages().top_level_for(bob).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, root.id);
    }
}
