//! Batch driver.
//!
//! Selects a working set of tracked series and runs a bounded number of
//! reconciliations at a time. Individual failures are counted, never fatal.

use std::sync::Arc;

use futures::{StreamExt, future, stream};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::clock::Clock;
use super::events::{PassKind, WatchlistEvent, WatchlistEventBroadcaster};
use super::reconciler::{ReconcileError, ReconcileOutcome, SeriesReconciler};
use super::revival::RevivalCheck;
use crate::Result;
use crate::database::repositories::TrackedSeriesRepository;
use crate::domain::{LifecycleState, TrackedSeries};

/// Default number of series reconciled concurrently.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Which series a pass covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkingSet {
    /// Every series not yet completed.
    Regular,
    /// Like `Regular`, minus series still inside their pause window.
    Due,
    /// Every completed series.
    Revival,
    /// One explicit series.
    Single(String),
}

impl WorkingSet {
    pub fn kind(&self) -> PassKind {
        match self {
            WorkingSet::Regular | WorkingSet::Due => PassKind::Regular,
            WorkingSet::Revival => PassKind::Revival,
            WorkingSet::Single(_) => PassKind::Single,
        }
    }
}

/// Aggregate counters of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub processed: usize,
    pub updated: usize,
    pub revived: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl BatchReport {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> usize {
        self.updated + self.revived + self.unchanged + self.removed
    }

    fn record(&mut self, result: &std::result::Result<ReconcileOutcome, ReconcileError>) {
        match result {
            Ok(ReconcileOutcome::Cancelled) => return,
            Ok(ReconcileOutcome::Updated { .. }) => self.updated += 1,
            Ok(ReconcileOutcome::Revived) => self.revived += 1,
            Ok(ReconcileOutcome::Unchanged) => self.unchanged += 1,
            Ok(ReconcileOutcome::Removed) => self.removed += 1,
            Err(_) => self.failed += 1,
        }
        self.processed += 1;
    }
}

pub struct BatchDriver {
    repo: Arc<dyn TrackedSeriesRepository>,
    reconciler: SeriesReconciler,
    revival: RevivalCheck,
    clock: Arc<dyn Clock>,
    events: WatchlistEventBroadcaster,
    max_concurrency: usize,
}

impl BatchDriver {
    pub fn new(
        repo: Arc<dyn TrackedSeriesRepository>,
        reconciler: SeriesReconciler,
        revival: RevivalCheck,
        clock: Arc<dyn Clock>,
        events: WatchlistEventBroadcaster,
    ) -> Self {
        Self {
            repo,
            reconciler,
            revival,
            clock,
            events,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Set the worker pool width. Zero is treated as one.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Load the series a working set covers.
    pub async fn select(&self, set: &WorkingSet) -> Result<Vec<TrackedSeries>> {
        match set {
            WorkingSet::Regular => Ok(self
                .repo
                .list_all_series()
                .await?
                .into_iter()
                .filter(|s| s.lifecycle_state.is_active())
                .collect()),
            WorkingSet::Due => {
                let today = self.clock.today();
                Ok(self
                    .repo
                    .list_all_series()
                    .await?
                    .into_iter()
                    .filter(|s| s.is_due(today))
                    .collect())
            }
            WorkingSet::Revival => {
                self.repo
                    .list_series_by_state(LifecycleState::Completed)
                    .await
            }
            WorkingSet::Single(local_id) => {
                Ok(self.repo.get_series(local_id).await?.into_iter().collect())
            }
        }
    }

    /// Run one pass over a working set.
    ///
    /// Only a failure to load the working set is an error. Cancellation stops
    /// new dispatches; reconciliations already running finish.
    pub async fn run(&self, set: WorkingSet, cancel: &CancellationToken) -> Result<BatchReport> {
        let pass = set.kind();
        let series = self.select(&set).await?;
        let total = series.len();
        let mut report = BatchReport::new(total);

        info!(pass = %pass, total, concurrency = self.max_concurrency, "Starting watchlist pass");

        let mut results = stream::iter(series)
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|record| async move {
                let result = self.dispatch(pass, &record, cancel).await;
                (record, result)
            })
            .buffer_unordered(self.max_concurrency);

        while let Some((record, result)) = results.next().await {
            if let Err(e) = &result {
                match e {
                    ReconcileError::Persistence(_) => error!(
                        local_id = %record.local_id,
                        name = %record.display_name,
                        error = %e,
                        "Failed to reconcile series"
                    ),
                    ReconcileError::RemoteFetch(_) | ReconcileError::LocalFetch(_) => warn!(
                        local_id = %record.local_id,
                        name = %record.display_name,
                        error = %e,
                        "Failed to reconcile series"
                    ),
                }
            }
            report.record(&result);

            debug!(pass = %pass, processed = report.processed, total, "Pass progress");
            self.events.publish(WatchlistEvent::PassProgress {
                pass,
                processed: report.processed,
                total,
            });
        }

        report.cancelled = cancel.is_cancelled() && report.processed < total;

        info!(
            pass = %pass,
            total,
            processed = report.processed,
            updated = report.updated,
            revived = report.revived,
            removed = report.removed,
            failed = report.failed,
            cancelled = report.cancelled,
            "Watchlist pass finished"
        );
        self.events.publish(WatchlistEvent::PassFinished {
            pass,
            total,
            succeeded: report.succeeded(),
            failed: report.failed,
            cancelled: report.cancelled,
        });

        Ok(report)
    }

    async fn dispatch(
        &self,
        pass: PassKind,
        series: &TrackedSeries,
        cancel: &CancellationToken,
    ) -> std::result::Result<ReconcileOutcome, ReconcileError> {
        match pass {
            PassKind::Regular | PassKind::Single => self.reconciler.reconcile(series, cancel).await,
            PassKind::Revival => self.revival.check(series, cancel).await,
        }
    }
}
