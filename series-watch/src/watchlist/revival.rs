//! Revival check for completed series.
//!
//! Runs rarely and only looks at the remote series status. A completed series
//! that shows new life goes back to `Watching` and loses its manual
//! `force_completed` override.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::clock::Clock;
use super::events::{WatchlistEvent, WatchlistEventBroadcaster};
use super::reconciler::{ReconcileError, ReconcileOutcome};
use crate::clients::RemoteCatalog;
use crate::database::repositories::TrackedSeriesRepository;
use crate::domain::{LifecycleState, SeriesStatus, TrackedSeries, is_terminal_status};

/// Whether a completed record should come back to life given a fresh status.
///
/// A terminal status never revives. A non-terminal status revives when the
/// stored status was terminal, or, for series that completed on their own,
/// when the catalog announces another episode. Series completed by the
/// finale heuristic still report an ongoing status, so that alone is not
/// enough.
pub fn should_revive(record: &TrackedSeries, observed: &SeriesStatus) -> bool {
    if observed.is_terminal() {
        return false;
    }
    if is_terminal_status(&record.remote_status) {
        return true;
    }
    !record.force_completed && observed.finale.announces_next_episode()
}

pub struct RevivalCheck {
    repo: Arc<dyn TrackedSeriesRepository>,
    catalog: Arc<dyn RemoteCatalog>,
    clock: Arc<dyn Clock>,
    events: WatchlistEventBroadcaster,
}

impl RevivalCheck {
    pub fn new(
        repo: Arc<dyn TrackedSeriesRepository>,
        catalog: Arc<dyn RemoteCatalog>,
        clock: Arc<dyn Clock>,
        events: WatchlistEventBroadcaster,
    ) -> Self {
        Self {
            repo,
            catalog,
            clock,
            events,
        }
    }

    /// Check one completed series.
    pub async fn check(
        &self,
        series: &TrackedSeries,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if cancel.is_cancelled() {
            return Ok(ReconcileOutcome::Cancelled);
        }
        if series.lifecycle_state != LifecycleState::Completed {
            debug!(local_id = %series.local_id, state = %series.lifecycle_state, "Not completed, skipping revival check");
            return Ok(ReconcileOutcome::Unchanged);
        }

        let observed = self
            .catalog
            .series_status(&series.remote_id)
            .await
            .map_err(ReconcileError::RemoteFetch)?;

        let revive = should_revive(series, &observed);
        if !revive && observed.status == series.remote_status {
            return Ok(ReconcileOutcome::Unchanged);
        }

        let mut record = series.clone();
        if revive {
            record.revive(observed.status.clone());
        } else {
            // Remember the latest status so a later terminal -> ongoing flip is seen.
            record.remote_status = observed.status.clone();
        }

        self.repo
            .upsert_series(&record)
            .await
            .map_err(ReconcileError::Persistence)?;

        if !revive {
            debug!(local_id = %record.local_id, status = %record.remote_status, "Recorded remote status");
            return Ok(ReconcileOutcome::Unchanged);
        }

        info!(
            local_id = %record.local_id,
            name = %record.display_name,
            status = %record.remote_status,
            was_forced = series.force_completed,
            "Completed series revived"
        );
        self.events.publish(WatchlistEvent::SeriesRevived {
            local_id: record.local_id.clone(),
            display_name: record.display_name.clone(),
            remote_status: record.remote_status.clone(),
            timestamp: self.clock.now(),
        });
        Ok(ReconcileOutcome::Revived)
    }
}
