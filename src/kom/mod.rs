//! Conference-server session boundary.
//!
//! The read marker only talks to the server through [`KomSession`]; the real
//! protocol client and [`MemorySession`] both implement it.

mod memory;
mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::{FixtureText, MarkCall, MemorySession, SessionFixture};
pub use types::{ConfNo, LocalNo, MiscInfo, PersNo, RecipientRole, Selection, TextNo, TextStat};

/// Errors reported by a session call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("not connected to server")]
    NotConnected,
    #[error("no such text: {0}")]
    NoSuchText(TextNo),
    #[error("protocol error {code}: {message}")]
    Protocol { code: u32, message: String },
    #[error("I/O error: {0}")]
    Io(String),
}

/// Operations the read marker needs from an active server session.
///
/// Implementations must be safe to share between the UI and the marker's
/// worker task.
#[async_trait]
pub trait KomSession: Send + Sync {
    /// Current transport state. Must not block.
    fn is_connected(&self) -> bool;

    /// Fetch a text's status. `Ok(None)` means the server had nothing usable.
    async fn get_text_stat(
        &self,
        text: TextNo,
        use_cache: bool,
    ) -> Result<Option<TextStat>, SessionError>;

    /// Mark the given local texts as read in one recipient conference.
    async fn mark_as_read(&self, recipient: ConfNo, local_nos: &[LocalNo])
    -> Result<(), SessionError>;

    /// The logged-in person.
    fn current_user(&self) -> PersNo;
}
