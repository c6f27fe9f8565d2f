//! Watchlist events.
//!
//! Events emitted by reconciliation passes for UI progress and notifications.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::LifecycleState;

/// Kind of pass that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassKind {
    /// Full reconciliation of active series.
    Regular,
    /// Revival check of completed series.
    Revival,
    /// On-demand reconciliation of one series.
    Single,
}

impl std::fmt::Display for PassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassKind::Regular => write!(f, "regular"),
            PassKind::Revival => write!(f, "revival"),
            PassKind::Single => write!(f, "single"),
        }
    }
}

/// Events emitted by the watchlist engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchlistEvent {
    /// A series moved to a different lifecycle state.
    StateChanged {
        local_id: String,
        display_name: String,
        old_state: LifecycleState,
        new_state: LifecycleState,
        paused_until: Option<NaiveDate>,
        timestamp: DateTime<Utc>,
    },
    /// The local library no longer knows the series; its record was deleted.
    SeriesRemoved {
        local_id: String,
        display_name: String,
        timestamp: DateTime<Utc>,
    },
    /// A completed series came back to life.
    SeriesRevived {
        local_id: String,
        display_name: String,
        remote_status: String,
        timestamp: DateTime<Utc>,
    },
    /// One more series of a pass has been handled.
    PassProgress {
        pass: PassKind,
        processed: usize,
        total: usize,
    },
    /// A pass has finished (or was cancelled).
    PassFinished {
        pass: PassKind,
        total: usize,
        succeeded: usize,
        failed: usize,
        cancelled: bool,
    },
}

impl WatchlistEvent {
    /// Get a human-readable description of the event.
    pub fn description(&self) -> String {
        match self {
            WatchlistEvent::StateChanged {
                display_name,
                old_state,
                new_state,
                paused_until,
                ..
            } => match paused_until {
                Some(until) => format!(
                    "{}: {} -> {} (until {})",
                    display_name, old_state, new_state, until
                ),
                None => format!("{}: {} -> {}", display_name, old_state, new_state),
            },
            WatchlistEvent::SeriesRemoved { display_name, .. } => {
                format!("{} was removed from the library", display_name)
            }
            WatchlistEvent::SeriesRevived {
                display_name,
                remote_status,
                ..
            } => format!("{} is back ({})", display_name, remote_status),
            WatchlistEvent::PassProgress {
                pass,
                processed,
                total,
            } => format!("{} pass: {}/{}", pass, processed, total),
            WatchlistEvent::PassFinished {
                pass,
                total,
                succeeded,
                failed,
                cancelled,
            } => {
                let suffix = if *cancelled { " (cancelled)" } else { "" };
                format!(
                    "{} pass finished: {} ok, {} failed of {}{}",
                    pass, succeeded, failed, total, suffix
                )
            }
        }
    }
}

/// Broadcaster for watchlist events.
#[derive(Clone)]
pub struct WatchlistEventBroadcaster {
    sender: broadcast::Sender<WatchlistEvent>,
}

impl WatchlistEventBroadcaster {
    /// Create a new broadcaster with default capacity (256).
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new broadcaster with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to watchlist events.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchlistEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: WatchlistEvent) {
        debug!(
            event = %event.description(),
            subscribers = self.sender.receiver_count(),
            "Publishing watchlist event"
        );
        let _ = self.sender.send(event);
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for WatchlistEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
