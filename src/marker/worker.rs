//! The read marker's background task: drains the queue one text at a time.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::config::MarkerConfig;
use crate::kom::{KomSession, TextNo};

use super::DispatchStats;
use super::fanout::resolve_targets;

/// What happened to one dequeued text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Recipients were resolved and `calls` mark calls attempted.
    Marked { calls: usize, failures: usize },
    /// Session was down when the text came up; the text is dropped.
    Offline,
    /// Text status could not be fetched; the text is dropped.
    NoMetadata,
}

pub(super) async fn marker_loop(
    session: Arc<dyn KomSession>,
    config: MarkerConfig,
    mut queue_rx: mpsc::UnboundedReceiver<TextNo>,
    stop: CancellationToken,
    stats_tx: Arc<watch::Sender<DispatchStats>>,
) {
    tracing::debug!("Read marker worker started");

    loop {
        let text = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            next = queue_rx.recv() => match next {
                Some(text) => text,
                None => {
                    tracing::debug!("Read marker queue closed");
                    break;
                }
            },
        };

        if stop.is_cancelled() {
            tracing::debug!("Stop requested, leaving text {} undispatched", text);
            break;
        }

        let outcome = mark_to_server(session.as_ref(), &config, text).await;
        record(&stats_tx, text, outcome);
    }

    tracing::debug!("Read marker worker done");
}

/// Mark one text read in every recipient conference it was sent to.
pub async fn mark_to_server(session: &dyn KomSession, config: &MarkerConfig, text: TextNo) -> Outcome {
    tracing::info!("Mark as read: {}", text);

    if !session.is_connected() {
        return Outcome::Offline;
    }

    let stat = match session.get_text_stat(text, config.use_cached_stat).await {
        Ok(Some(stat)) => stat,
        Ok(None) => {
            tracing::debug!("No text stat for {}", text);
            return Outcome::NoMetadata;
        }
        Err(e) => {
            tracing::debug!("Failed to get text stat for {}: {}", text, e);
            return Outcome::NoMetadata;
        }
    };

    let targets = resolve_targets(text, &stat);
    let mut failures = 0;

    for target in &targets {
        tracing::info!(
            "markAsRead: global {} rcpt {} local {}",
            text,
            target.recipient,
            target.local_no
        );
        if let Err(e) = session
            .mark_as_read(target.recipient, &[target.local_no])
            .await
        {
            tracing::warn!(
                "Failed to mark text {} read in {}: {}",
                text,
                target.recipient,
                e
            );
            failures += 1;
        }
    }

    Outcome::Marked {
        calls: targets.len(),
        failures,
    }
}

fn record(stats_tx: &watch::Sender<DispatchStats>, text: TextNo, outcome: Outcome) {
    match outcome {
        Outcome::Marked { calls, failures } => {
            tracing::info!(
                "Mark as read finished: {} ({} calls, {} failed)",
                text,
                calls,
                failures
            );
        }
        Outcome::Offline => {
            tracing::debug!("Not connected, dropping text {}", text);
        }
        Outcome::NoMetadata => {
            tracing::debug!("Dropping text {} without recipients", text);
        }
    }

    stats_tx.send_modify(|stats| {
        stats.handled += 1;
        match outcome {
            Outcome::Marked { calls, failures } => {
                stats.mark_calls += calls as u64;
                stats.mark_failures += failures as u64;
            }
            Outcome::Offline => stats.offline += 1,
            Outcome::NoMetadata => stats.no_metadata += 1,
        }
    });
}
