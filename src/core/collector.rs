//! Fan-out/fan-in collection of venue results within a bounded window.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::domain::model::{AggregateShowings, Collection, ReceivedSet, SourceResult};
use crate::domain::ports::SourceAdapter;

/// How a bounded wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanInOutcome {
    pub received: usize,
    pub expected: usize,
    pub timed_out: bool,
}

impl FanInOutcome {
    pub fn is_complete(&self) -> bool {
        self.received == self.expected
    }
}

/// Drains `rx` until `expected` items arrived, every sender is gone, or
/// `window` elapsed, whichever comes first. Items are handed to `on_item` in
/// arrival order.
///
/// Producers still running after the window keep their sender; their sends
/// fail once `rx` is dropped, so the channel must be sized for one message
/// per producer to never block them.
pub async fn fan_in<T, F>(
    mut rx: mpsc::Receiver<T>,
    expected: usize,
    window: Duration,
    mut on_item: F,
) -> FanInOutcome
where
    F: FnMut(T),
{
    let deadline = Instant::now() + window;
    let mut remaining = expected;
    let mut timed_out = false;

    while remaining > 0 {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(item)) => {
                on_item(item);
                remaining -= 1;
            }
            // every producer finished; the rest failed without reporting
            Ok(None) => break,
            Err(_) => {
                timed_out = true;
                break;
            }
        }
    }

    FanInOutcome {
        received: expected - remaining,
        expected,
        timed_out,
    }
}

/// Launches one task per adapter and merges whatever answers inside the
/// collection window.
pub struct Collector {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    window: Duration,
}

impl Collector {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, window: Duration) -> Self {
        Self { adapters, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn venue_count(&self) -> usize {
        self.adapters.len()
    }

    pub async fn collect(&self) -> Collection {
        let expected = self.adapters.len();
        let (tx, rx) = mpsc::channel::<SourceResult>(expected.max(1));
        let mut received = ReceivedSet::expecting(self.adapters.iter().map(|a| a.venue()));

        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let tx = tx.clone();
            tokio::spawn(async move {
                let venue = adapter.venue();
                tracing::debug!("🎬 {}: fetching repertoire", venue);
                match adapter.run().await {
                    Ok(titles) => {
                        tracing::debug!("🎬 {}: {} titles", venue, titles.len());
                        // the coordinator may have stopped listening already
                        let _ = tx.send(SourceResult { venue, titles }).await;
                    }
                    Err(e) => {
                        tracing::warn!("⚠️ {}: no results ({})", venue, e);
                    }
                }
            });
        }

        // rx closes once every adapter task has finished
        drop(tx);

        let mut showings = AggregateShowings::new();
        let outcome = fan_in(rx, expected, self.window, |result: SourceResult| {
            tracing::info!(
                "📥 {}: {} titles received",
                result.venue,
                result.titles.len()
            );
            received.mark(result.venue);
            showings.merge(result);
        })
        .await;

        if outcome.timed_out {
            tracing::warn!(
                "⏰ Collection window of {:?} elapsed with {}/{} venues reported",
                self.window,
                outcome.received,
                outcome.expected
            );
        } else {
            tracing::info!(
                "📦 Collection finished: {}/{} venues reported",
                outcome.received,
                outcome.expected
            );
        }

        Collection { showings, received }
    }
}
