//! Edit history model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::MessageId;
use crate::user::UserId;

/// Unique identifier for a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryId(pub i64);

impl HistoryId {
    /// Create a new history ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for HistoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A snapshot of a message's content taken just before an edit.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    /// Unique identifier.
    pub id: HistoryId,
    /// The message that was edited.
    pub message: MessageId,
    /// The content the message had before the edit.
    pub old_content: String,
    /// When the edit was made.
    pub edited_at: DateTime<Utc>,
    /// The user who made the edit, when known.
    ///
    /// Cleared (not deleted) when that user is removed, so the audit trail
    /// survives account deletion.
    pub edited_by: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_id_display() {
        assert_eq!(format!("{}", HistoryId::new(3)), "3");
    }
}
