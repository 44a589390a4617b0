//! Notifications derived from message delivery.
//!
//! One notification exists per (user, message) pair; it is created inside
//! the same transaction as the message it references.

mod model;
mod repository;

pub use model::{Notification, NotificationId};
pub use repository::NotificationRepository;
