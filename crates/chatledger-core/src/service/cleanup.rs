//! User deletion and its cascade.

use sqlx::sqlite::SqliteConnection;
use tracing::info;

use crate::history::HistoryRepository;
use crate::store::Store;
use crate::user::{UserId, UserRepository};
use crate::{Error, Result};

/// Row counts affected by a user deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserCleanup {
    /// Messages removed (sent, received, and every reply beneath them).
    pub messages_deleted: u64,
    /// Notifications removed (owned by the user or referencing a removed
    /// message).
    pub notifications_deleted: u64,
    /// History rows removed along with their messages.
    pub history_deleted: u64,
    /// History rows retained with their editor attribution cleared.
    pub editor_refs_cleared: u64,
}

/// Delete a user and every dependent record, atomically.
///
/// In one transaction: editor attributions held by the user are cleared
/// (those audit rows survive); then the history rows, notifications, and
/// messages tied to the user's conversations are removed; finally the user
/// row itself. Messages are doomed when the user sent or received them —
/// and, transitively, every reply beneath a doomed message goes with it.
///
/// # Errors
///
/// Returns [`Error::UserNotFound`] when the user does not exist, or a
/// database error. On any failure the whole cascade rolls back.
pub async fn delete_user(store: &Store, id: UserId) -> Result<UserCleanup> {
    let mut tx = store.pool().begin().await?;

    let Some(user) = UserRepository::fetch(&mut tx, id).await? else {
        return Err(Error::UserNotFound(id.to_string()));
    };

    let editor_refs_cleared = HistoryRepository::clear_editor(&mut tx, id).await?;
    let history_deleted = delete_history_of_doomed(&mut tx, id).await?;
    let notifications_deleted = delete_notifications(&mut tx, id).await?;
    let messages_deleted = delete_doomed_messages(&mut tx, id).await?;
    UserRepository::delete(&mut tx, id).await?;

    tx.commit().await?;

    let cleanup = UserCleanup {
        messages_deleted,
        notifications_deleted,
        history_deleted,
        editor_refs_cleared,
    };
    info!(
        "removed user {} ({}): {} messages, {} notifications, {} history rows deleted, {} editor refs cleared",
        id,
        user.username,
        cleanup.messages_deleted,
        cleanup.notifications_deleted,
        cleanup.history_deleted,
        cleanup.editor_refs_cleared,
    );
    Ok(cleanup)
}

/// History rows of doomed messages go with the message.
async fn delete_history_of_doomed(conn: &mut SqliteConnection, user: UserId) -> Result<u64> {
    let done = sqlx::query(
        r"
        WITH RECURSIVE doomed(id) AS (
            SELECT id FROM messages WHERE sender_id = ?1 OR receiver_id = ?1
            UNION
            SELECT m.id FROM messages m JOIN doomed d ON m.parent_id = d.id
        )
        DELETE FROM message_history WHERE message_id IN (SELECT id FROM doomed)
        ",
    )
    .bind(user.0)
    .execute(conn)
    .await?;
    Ok(done.rows_affected())
}

/// Notifications owned by the user, plus notifications held by other users
/// about doomed messages.
async fn delete_notifications(conn: &mut SqliteConnection, user: UserId) -> Result<u64> {
    let done = sqlx::query(
        r"
        WITH RECURSIVE doomed(id) AS (
            SELECT id FROM messages WHERE sender_id = ?1 OR receiver_id = ?1
            UNION
            SELECT m.id FROM messages m JOIN doomed d ON m.parent_id = d.id
        )
        DELETE FROM notifications
        WHERE user_id = ?1 OR message_id IN (SELECT id FROM doomed)
        ",
    )
    .bind(user.0)
    .execute(conn)
    .await?;
    Ok(done.rows_affected())
}

async fn delete_doomed_messages(conn: &mut SqliteConnection, user: UserId) -> Result<u64> {
    let done = sqlx::query(
        r"
        WITH RECURSIVE doomed(id) AS (
            SELECT id FROM messages WHERE sender_id = ?1 OR receiver_id = ?1
            UNION
            SELECT m.id FROM messages m JOIN doomed d ON m.parent_id = d.id
        )
        DELETE FROM messages WHERE id IN (SELECT id FROM doomed)
        ",
    )
    .bind(user.0)
    .execute(conn)
    .await?;
    Ok(done.rows_affected())
}
