//! Message edit history.
//!
//! Every content edit snapshots the prior version into an append-only log,
//! iterated most-recent-first.

mod model;
mod repository;

pub use model::{HistoryId, MessageHistory};
pub use repository::HistoryRepository;
