//! Read-mark dispatching for a conference-server client.
//!
//! The UI calls [`ReadMarker::mark`] whenever the user reads a text. The
//! marker deduplicates those calls and reports each text to the server from a
//! background task, through whatever implements [`KomSession`].

pub mod config;
pub mod constants;
pub mod kom;
pub mod logging;
pub mod marker;

pub use config::{Config, MarkerConfig};
pub use kom::{KomSession, MemorySession, SessionError, TextNo, TextStat};
pub use marker::{DispatchStats, ReadMarker};
