//! Direct messages.
//!
//! Provides the message model, storage, and draft validation. Messages form
//! threads through an optional parent reference and carry read tracking for
//! the receiver.

mod model;
mod repository;
mod validation;

pub use model::{Message, MessageId, NewMessage};
pub use repository::MessageRepository;
pub use validation::{ValidationError, ValidationResult, validate_draft};
