//! Message model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

/// Unique identifier for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl MessageId {
    /// Create a new message ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored message.
#[derive(Debug, Clone)]
pub struct Message {
    /// Unique identifier.
    pub id: MessageId,
    /// The user who sent this message.
    pub sender: UserId,
    /// The user who receives this message.
    pub receiver: UserId,
    /// Message content.
    pub content: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
    /// Whether the content has been edited since creation.
    pub edited: bool,
    /// When the content was last edited.
    pub edited_at: Option<DateTime<Utc>>,
    /// Parent message for replies (None for top-level messages).
    pub parent: Option<MessageId>,
    /// Whether the receiver has read the message.
    pub is_read: bool,
    /// When the receiver read the message.
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Whether this message is a reply to another message.
    #[must_use]
    pub const fn is_reply(&self) -> bool {
        self.parent.is_some()
    }
}

/// A message that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// The sending user.
    pub sender: UserId,
    /// The receiving user.
    pub receiver: UserId,
    /// Message content.
    pub content: String,
    /// Parent message when this is a reply.
    pub parent: Option<MessageId>,
}

impl NewMessage {
    /// Create a new top-level message draft.
    #[must_use]
    pub fn new(sender: UserId, receiver: UserId, content: impl Into<String>) -> Self {
        Self {
            sender,
            receiver,
            content: content.into(),
            parent: None,
        }
    }

    /// Mark the draft as a reply to an existing message.
    #[must_use]
    pub const fn with_parent(mut self, parent: MessageId) -> Self {
        self.parent = Some(parent);
        self
    }
}
