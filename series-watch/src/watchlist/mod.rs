//! Watchlist reconciliation engine.
//!
//! Keeps each tracked series in one of three lifecycle states by comparing
//! the local library against the remote catalog:
//! - `diff` / `completeness`: pure comparisons
//! - `decision`: the ordered rule table choosing the next state
//! - `reconciler` / `revival`: per-series work with I/O
//! - `batch`: bounded concurrent passes over a working set
//! - `acquisition`, `service`, `scheduler`: the outer surface

pub mod acquisition;
pub mod batch;
pub mod clock;
pub mod completeness;
pub mod decision;
pub mod diff;
pub mod events;
pub mod reconciler;
pub mod revival;
pub mod scheduler;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use acquisition::{AcquisitionPass, AcquisitionReport};
pub use batch::{BatchDriver, BatchReport, DEFAULT_MAX_CONCURRENCY, WorkingSet};
pub use clock::{Clock, FixedClock, SystemClock};
pub use completeness::metadata_complete;
pub use decision::{Decision, DecisionInput, DecisionRule, decide};
pub use diff::{SeriesDiff, compute_diff};
pub use events::{PassKind, WatchlistEvent, WatchlistEventBroadcaster};
pub use reconciler::{ReconcileError, ReconcileOutcome, SeriesReconciler};
pub use revival::{RevivalCheck, should_revive};
pub use scheduler::WatchlistScheduler;
pub use service::{Registration, WatchlistService};
