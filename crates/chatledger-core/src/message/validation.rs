//! Message draft validation.

use super::model::NewMessage;

/// Validation error for a message draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Sender and receiver are the same user.
    SameSenderReceiver,
    /// Message content is empty.
    EmptyContent,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::SameSenderReceiver => "Sender and receiver cannot be the same user",
            Self::EmptyContent => "Message content is required",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::SameSenderReceiver => "receiver",
            Self::EmptyContent => "content",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a message draft.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a message draft.
///
/// Returns `Ok(())` if valid, or `Err(Vec<ValidationError>)` with all errors.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_draft(draft: &NewMessage) -> ValidationResult {
    let mut errors = Vec::new();

    if draft.sender == draft.receiver {
        errors.push(ValidationError::SameSenderReceiver);
    }

    if draft.content.trim().is_empty() {
        errors.push(ValidationError::EmptyContent);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::user::UserId;

    #[test]
    fn test_self_message_rejected() {
        let draft = NewMessage::new(UserId::new(1), UserId::new(1), "hello");
        let errors = validate_draft(&draft).unwrap_err();
        assert_eq!(errors, vec![ValidationError::SameSenderReceiver]);
    }

    #[test]
    fn test_empty_content_rejected() {
        let draft = NewMessage::new(UserId::new(1), UserId::new(2), "   ");
        let errors = validate_draft(&draft).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptyContent]);
    }

    #[test]
    fn test_both_errors_reported() {
        let draft = NewMessage::new(UserId::new(3), UserId::new(3), "");
        let errors = validate_draft(&draft).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_valid_draft() {
        let draft = NewMessage::new(UserId::new(1), UserId::new(2), "hello");
        assert!(validate_draft(&draft).is_ok());
    }
}
