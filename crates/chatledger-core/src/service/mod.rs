//! Write-path services.
//!
//! Each function here is one unit of work: it opens a transaction, performs
//! the primary write plus every derived write (notification, history
//! snapshot, cascade), and commits. Nothing happens through implicit hooks;
//! the ordering is exactly what is written.

mod cleanup;
mod messaging;

pub use cleanup::{UserCleanup, delete_user};
pub use messaging::{create_user, edit_message, send_message};
