//! Error types for the core library.

use thiserror::Error;

use crate::message::MessageId;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Message not found.
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    /// A user with the same username or email already exists.
    #[error("User already exists: {0}")]
    DuplicateUser(String),

    /// Message draft failed validation.
    #[error("Invalid message: {}", join_errors(.0))]
    InvalidMessage(Vec<crate::message::ValidationError>),

    /// User draft failed validation.
    #[error("Invalid user: {}", join_errors(.0))]
    InvalidUser(Vec<crate::user::ValidationError>),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

fn join_errors<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
