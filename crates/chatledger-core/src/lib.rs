//! # chatledger-core
//!
//! Core messaging domain for `ChatLedger`.
//!
//! This crate provides:
//! - User accounts
//! - Direct messages with threading and read tracking
//! - Notifications created when a message is delivered
//! - Append-only edit history for message content
//! - Local storage (`SQLite`)
//! - Transactional write-path services
//!
//! Derived records (notifications, history snapshots) are never produced by
//! implicit hooks: the service functions in [`service`] perform them as
//! explicit steps inside the same transaction as the triggering write, so
//! ordering is visible and partial failures roll back.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod history;
pub mod message;
pub mod notification;
pub mod service;
pub mod store;
pub mod user;

pub use error::{Error, Result};
pub use history::{HistoryId, HistoryRepository, MessageHistory};
pub use message::{Message, MessageId, MessageRepository, NewMessage, validate_draft};
pub use notification::{Notification, NotificationId, NotificationRepository};
pub use service::{UserCleanup, create_user, delete_user, edit_message, send_message};
pub use store::Store;
pub use user::{NewUser, User, UserId, UserRepository, validate_new_user};
