//! Read marker: records texts the user has read and reports them to the
//! server in the background.
//!
//! - `mod.rs` - The [`ReadMarker`] handle used by the UI
//! - `worker.rs` - The single background task that talks to the server
//! - `fanout.rs` - Which recipients a text must be marked in
//!
//! [`ReadMarker::mark`] never waits for the network. Each text is claimed in
//! the local marked set and queued at most once per session; the worker then
//! makes one mark-as-read call per distinct recipient. Failures are logged and
//! the text is not retried until [`ReadMarker::reset`] clears the set.

mod fanout;
mod worker;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::MarkerConfig;
use crate::kom::{KomSession, TextNo};

pub use fanout::{MarkTarget, resolve_targets};
pub use worker::{Outcome, mark_to_server};

/// Diagnostic counters for one read marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Texts claimed and queued by `mark`
    pub accepted: u64,
    /// Texts the worker has finished with, whatever the outcome
    pub handled: u64,
    /// Mark-as-read calls attempted
    pub mark_calls: u64,
    /// Mark-as-read calls that failed
    pub mark_failures: u64,
    /// Texts dropped because the session was down
    pub offline: u64,
    /// Texts dropped because their status could not be fetched
    pub no_metadata: u64,
}

/// Handle to a running read marker. One per server session.
pub struct ReadMarker {
    marked: Mutex<HashSet<TextNo>>,
    queue_tx: mpsc::UnboundedSender<TextNo>,
    stop: CancellationToken,
    stats_tx: Arc<watch::Sender<DispatchStats>>,
    stats_rx: watch::Receiver<DispatchStats>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ReadMarker {
    /// Create a read marker for `session` and start its worker task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(session: Arc<dyn KomSession>, config: MarkerConfig) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (stats_tx, stats_rx) = watch::channel(DispatchStats::default());
        let stats_tx = Arc::new(stats_tx);
        let stop = CancellationToken::new();

        let task = tokio::spawn(worker::marker_loop(
            session,
            config,
            queue_rx,
            stop.clone(),
            Arc::clone(&stats_tx),
        ));

        Self {
            marked: Mutex::new(HashSet::new()),
            queue_tx,
            stop,
            stats_tx,
            stats_rx,
            task: Mutex::new(Some(task)),
        }
    }

    fn marked(&self) -> MutexGuard<'_, HashSet<TextNo>> {
        // The set holds plain integers, so a poisoned lock is still consistent
        self.marked
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record `text` as read and queue it for the server if it is new.
    pub fn mark(&self, text: TextNo) {
        if text == 0 {
            tracing::debug!("Ignoring mark of text 0");
            return;
        }

        {
            let mut marked = self.marked();
            if !marked.insert(text) {
                tracing::debug!("No server mark for {}, already marked", text);
                return;
            }
            // Queue under the lock so queue order matches claim order
            if self.queue_tx.send(text).is_err() {
                tracing::warn!("Read marker stopped, text {} not sent to server", text);
                return;
            }
        }

        tracing::debug!("Queued text {} for server mark", text);
        self.stats_tx.send_modify(|stats| stats.accepted += 1);
    }

    /// Whether `mark` has accepted `text` in this session.
    pub fn is_locally_marked(&self, text: TextNo) -> bool {
        self.marked().contains(&text)
    }

    /// Forget every local mark. Texts already queued are still sent.
    pub fn reset(&self) {
        tracing::info!("Read marker reset");
        self.marked().clear();
    }

    /// Ask the worker to stop. A dispatch already in progress completes.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Stop the worker and wait for it to exit.
    pub async fn shutdown(&self) {
        self.stop();
        let task = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            tracing::warn!("Read marker worker ended abnormally: {}", e);
        }
    }

    /// Subscribe to dispatch counters.
    pub fn stats(&self) -> watch::Receiver<DispatchStats> {
        self.stats_rx.clone()
    }
}

impl Drop for ReadMarker {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
