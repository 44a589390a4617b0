//! Message write paths: user creation, sending, and editing.

use chrono::Utc;
use tracing::{debug, info};

use crate::message::{Message, MessageId, MessageRepository, NewMessage, validate_draft};
use crate::notification::NotificationRepository;
use crate::store::Store;
use crate::user::{NewUser, User, UserId, UserRepository, validate_new_user};
use crate::{Error, Result};

/// Create a user account.
///
/// # Errors
///
/// Returns [`Error::InvalidUser`] when the draft fails validation,
/// [`Error::DuplicateUser`] when the username or email is taken, or a
/// database error.
pub async fn create_user(store: &Store, draft: NewUser) -> Result<User> {
    validate_new_user(&draft).map_err(Error::InvalidUser)?;
    let user = store.users().create(&draft).await?;
    info!("user {} ({}) created", user.id, user.username);
    Ok(user)
}

/// Send a message and, in the same transaction, create the receiver's
/// notification.
///
/// The notification is created with create-if-absent semantics: exactly one
/// notification per (receiver, message) pair, and only on initial creation
/// of the message, never on later updates.
///
/// # Errors
///
/// Returns [`Error::InvalidMessage`] when sender and receiver are the same
/// user or the content is empty, [`Error::UserNotFound`] /
/// [`Error::MessageNotFound`] when a participant or the reply parent does
/// not exist, or a database error. On any failure nothing is persisted.
pub async fn send_message(store: &Store, draft: NewMessage) -> Result<Message> {
    validate_draft(&draft).map_err(Error::InvalidMessage)?;

    let mut tx = store.pool().begin().await?;

    for participant in [draft.sender, draft.receiver] {
        if UserRepository::fetch(&mut tx, participant).await?.is_none() {
            return Err(Error::UserNotFound(participant.to_string()));
        }
    }
    if let Some(parent) = draft.parent
        && MessageRepository::fetch(&mut tx, parent).await?.is_none()
    {
        return Err(Error::MessageNotFound(parent));
    }

    let message = MessageRepository::insert(&mut tx, &draft, Utc::now()).await?;
    let created = NotificationRepository::create_if_absent(
        &mut tx,
        draft.receiver,
        message.id,
        message.timestamp,
    )
    .await?;
    tx.commit().await?;

    debug!(
        "notification {} for user {} about message {}",
        if created { "created" } else { "already present" },
        draft.receiver,
        message.id
    );
    info!(
        "message {} sent from {} to {}",
        message.id, message.sender, message.receiver
    );
    Ok(message)
}

/// Edit a message's content, snapshotting the prior version first.
///
/// Inside one transaction: the current content is read, appended to the
/// edit history with `editor` attribution, and then overwritten with
/// `new_content` while setting the edited flag. An edit that does not
/// change the content writes nothing at all.
///
/// # Errors
///
/// Returns [`Error::MessageNotFound`] when the message does not exist,
/// [`Error::UserNotFound`] when an editor is given but unknown,
/// [`Error::InvalidMessage`] for empty content, or a database error. On any
/// failure nothing is persisted.
pub async fn edit_message(
    store: &Store,
    id: MessageId,
    new_content: &str,
    editor: Option<UserId>,
) -> Result<Message> {
    if new_content.trim().is_empty() {
        return Err(Error::InvalidMessage(vec![
            crate::message::ValidationError::EmptyContent,
        ]));
    }

    let mut tx = store.pool().begin().await?;

    let Some(current) = MessageRepository::fetch(&mut tx, id).await? else {
        return Err(Error::MessageNotFound(id));
    };

    if current.content == new_content {
        // Nothing changed: no history row, no edited flag, no write.
        return Ok(current);
    }

    if let Some(editor) = editor
        && UserRepository::fetch(&mut tx, editor).await?.is_none()
    {
        return Err(Error::UserNotFound(editor.to_string()));
    }

    let edited_at = Utc::now();
    crate::history::HistoryRepository::append(&mut tx, id, &current.content, editor, edited_at)
        .await?;
    MessageRepository::apply_edit(&mut tx, id, new_content, edited_at).await?;
    tx.commit().await?;

    info!("message {id} edited");
    Ok(Message {
        content: new_content.to_string(),
        edited: true,
        edited_at: Some(edited_at),
        ..current
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::ValidationError;

    async fn seed(store: &Store) -> (UserId, UserId) {
        let alice = create_user(store, NewUser::new("alice", "alice@example.com"))
            .await
            .unwrap();
        let bob = create_user(store, NewUser::new("bob", "bob@example.com"))
            .await
            .unwrap();
        (alice.id, bob.id)
    }

    #[tokio::test]
    async fn test_send_creates_exactly_one_notification() {
        let store = Store::in_memory().await.unwrap();
        let (alice, bob) = seed(&store).await;

        let message = send_message(&store, NewMessage::new(alice, bob, "hello"))
            .await
            .unwrap();

        let notifications = store.notifications().for_user(bob).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, message.id);
        assert_eq!(notifications[0].user, bob);
        assert!(!notifications[0].is_read);
        // The sender gets nothing.
        assert!(store.notifications().for_user(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_message_creates_second_notification() {
        let store = Store::in_memory().await.unwrap();
        let (alice, bob) = seed(&store).await;

        let first = send_message(&store, NewMessage::new(alice, bob, "one"))
            .await
            .unwrap();
        let second = send_message(&store, NewMessage::new(alice, bob, "two"))
            .await
            .unwrap();

        let notifications = store.notifications().for_user(bob).await.unwrap();
        assert_eq!(notifications.len(), 2);
        let referenced: Vec<MessageId> = notifications.iter().map(|n| n.message).collect();
        assert!(referenced.contains(&first.id));
        assert!(referenced.contains(&second.id));
    }

    #[tokio::test]
    async fn test_self_message_rejected() {
        let store = Store::in_memory().await.unwrap();
        let (alice, _) = seed(&store).await;

        let err = send_message(&store, NewMessage::new(alice, alice, "hi me"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidMessage(errors) if errors == vec![ValidationError::SameSenderReceiver]
        ));
        // Nothing was persisted.
        assert!(store.messages().inbox(alice).await.unwrap().is_empty());
        assert!(store.notifications().for_user(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_to_unknown_user_rolls_back() {
        let store = Store::in_memory().await.unwrap();
        let (alice, _) = seed(&store).await;

        let ghost = UserId::new(999);
        let err = send_message(&store, NewMessage::new(alice, ghost, "anyone there?"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UserNotFound(_)));
        assert!(store.messages().sent(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reply_requires_existing_parent() {
        let store = Store::in_memory().await.unwrap();
        let (alice, bob) = seed(&store).await;

        let missing = MessageId::new(404);
        let err = send_message(
            &store,
            NewMessage::new(alice, bob, "re:").with_parent(missing),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::MessageNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_edit_snapshots_old_content() {
        let store = Store::in_memory().await.unwrap();
        let (alice, bob) = seed(&store).await;

        let message = send_message(&store, NewMessage::new(alice, bob, "X"))
            .await
            .unwrap();
        let edited = edit_message(&store, message.id, "Y", Some(alice))
            .await
            .unwrap();

        assert_eq!(edited.content, "Y");
        assert!(edited.edited);
        assert!(edited.edited_at.is_some());

        let history = store.history().for_message(message.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_content, "X");
        assert_eq!(history[0].edited_by, Some(alice));

        let stored = store.messages().get(message.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "Y");
        assert!(stored.edited);

        // Editing never produces another notification.
        assert_eq!(store.notifications().for_user(bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_edit_writes_nothing() {
        let store = Store::in_memory().await.unwrap();
        let (alice, bob) = seed(&store).await;

        let message = send_message(&store, NewMessage::new(alice, bob, "same"))
            .await
            .unwrap();
        let result = edit_message(&store, message.id, "same", Some(alice))
            .await
            .unwrap();

        assert!(!result.edited);
        assert!(store.history().for_message(message.id).await.unwrap().is_empty());

        let stored = store.messages().get(message.id).await.unwrap().unwrap();
        assert!(!stored.edited);
        assert!(stored.edited_at.is_none());
    }

    #[tokio::test]
    async fn test_three_edits_three_history_rows_newest_first() {
        let store = Store::in_memory().await.unwrap();
        let (alice, bob) = seed(&store).await;

        let message = send_message(&store, NewMessage::new(alice, bob, "v1"))
            .await
            .unwrap();
        edit_message(&store, message.id, "v2", Some(alice)).await.unwrap();
        edit_message(&store, message.id, "v3", Some(alice)).await.unwrap();
        edit_message(&store, message.id, "v4", Some(alice)).await.unwrap();

        let history = store.history().for_message(message.id).await.unwrap();
        assert_eq!(history.len(), 3);
        let versions: Vec<&str> = history.iter().map(|h| h.old_content.as_str()).collect();
        assert_eq!(versions, vec!["v3", "v2", "v1"]);
    }

    #[tokio::test]
    async fn test_edit_without_editor_attribution() {
        let store = Store::in_memory().await.unwrap();
        let (alice, bob) = seed(&store).await;

        let message = send_message(&store, NewMessage::new(alice, bob, "v1"))
            .await
            .unwrap();
        edit_message(&store, message.id, "v2", None).await.unwrap();

        let history = store.history().for_message(message.id).await.unwrap();
        assert!(history[0].edited_by.is_none());
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let store = Store::in_memory().await.unwrap();
        let err = create_user(&store, NewUser::new("", "bad"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUser(_)));
    }
}
