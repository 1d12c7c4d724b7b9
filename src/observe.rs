//! Pluggable reporting of per-feed outcomes.

use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::FailureKind;

/// Receives feed outcomes from the fetcher.
///
/// The pipeline itself only calls this trait; [`TracingObserver`] is the
/// production implementation.
pub trait FeedObserver: Send + Sync {
    fn feed_failed(&self, feed: &str, kind: FailureKind, cause: &str);

    fn feed_loaded(&self, _feed: &str, _entities: usize) {}
}

/// Forwards outcomes to `tracing`. Timeouts are logged at debug level so a slow
/// upstream does not flood the logs every cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl FeedObserver for TracingObserver {
    fn feed_failed(&self, feed: &str, kind: FailureKind, cause: &str) {
        match kind {
            FailureKind::Timeout => debug!(feed, %kind, cause, "Feed request timed out"),
            FailureKind::Empty => debug!(feed, %kind, cause, "Feed body empty"),
            kind if kind.is_payload_error() => {
                warn!(feed, %kind, cause, "Feed returned an unusable body")
            }
            _ => warn!(feed, %kind, cause, "Feed unavailable"),
        }
    }

    fn feed_loaded(&self, feed: &str, entities: usize) {
        debug!(feed, entities, "Feed decoded");
    }
}

/// Collects failures in memory. Useful for tests and for callers that want to
/// surface per-cycle feed health.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    failures: Mutex<Vec<(String, FailureKind)>>,
}

impl RecordingObserver {
    pub fn failures(&self) -> Vec<(String, FailureKind)> {
        self.failures
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    pub fn kind_for(&self, feed: &str) -> Option<FailureKind> {
        self.failures()
            .into_iter()
            .find(|(name, _)| name == feed)
            .map(|(_, kind)| kind)
    }
}

impl FeedObserver for RecordingObserver {
    fn feed_failed(&self, feed: &str, kind: FailureKind, _cause: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((feed.to_string(), kind));
        }
    }
}
