//! Notification model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::MessageId;
use crate::user::UserId;

/// Unique identifier for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub i64);

impl NotificationId {
    /// Create a new notification ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A notification telling a user a message arrived for them.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Unique identifier.
    pub id: NotificationId,
    /// The user this notification belongs to.
    pub user: UserId,
    /// The message that triggered this notification.
    pub message: MessageId,
    /// Whether the notification has been read.
    pub is_read: bool,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}
