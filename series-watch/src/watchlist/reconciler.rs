//! Per-series reconciliation.
//!
//! One reconciliation runs strictly in order: liveness, remote fetch, local
//! fetch, diff and decision, persist, then a best-effort metadata patch.
//! A failure before the persist step leaves the stored record untouched.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::completeness::metadata_complete;
use super::decision::{DecisionInput, DecisionRule, decide};
use super::diff::compute_diff;
use super::events::{WatchlistEvent, WatchlistEventBroadcaster};
use crate::clients::{LocalLibrary, RemoteCatalog};
use crate::database::repositories::TrackedSeriesRepository;
use crate::domain::{
    EpisodeMetadataPatch, LifecycleState, LocalInventory, RemoteSeries, TrackedSeries,
};

/// Why a single series could not be reconciled.
///
/// None of these stop a pass; the driver counts and logs them.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("remote catalog fetch failed: {0}")]
    RemoteFetch(#[source] crate::Error),

    #[error("local library fetch failed: {0}")]
    LocalFetch(#[source] crate::Error),

    #[error("persisting tracked series failed: {0}")]
    Persistence(#[source] crate::Error),
}

/// What happened to one series during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The record was recomputed and stored.
    Updated {
        previous: LifecycleState,
        state: LifecycleState,
        paused_until: Option<NaiveDate>,
        rule: DecisionRule,
    },
    /// A completed series was reactivated.
    Revived,
    /// Checked, nothing to change.
    Unchanged,
    /// The local library no longer has the series; the record was deleted.
    Removed,
    /// The pass was cancelled before this series started.
    Cancelled,
}

pub struct SeriesReconciler {
    repo: Arc<dyn TrackedSeriesRepository>,
    library: Arc<dyn LocalLibrary>,
    catalog: Arc<dyn RemoteCatalog>,
    clock: Arc<dyn Clock>,
    events: WatchlistEventBroadcaster,
}

impl SeriesReconciler {
    pub fn new(
        repo: Arc<dyn TrackedSeriesRepository>,
        library: Arc<dyn LocalLibrary>,
        catalog: Arc<dyn RemoteCatalog>,
        clock: Arc<dyn Clock>,
        events: WatchlistEventBroadcaster,
    ) -> Self {
        Self {
            repo,
            library,
            catalog,
            clock,
            events,
        }
    }

    /// Reconcile one tracked series.
    pub async fn reconcile(
        &self,
        series: &TrackedSeries,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if cancel.is_cancelled() {
            debug!(local_id = %series.local_id, "Pass cancelled, skipping series");
            return Ok(ReconcileOutcome::Cancelled);
        }

        let exists = self
            .library
            .exists(&series.local_id)
            .await
            .map_err(ReconcileError::LocalFetch)?;
        if !exists {
            return self.remove(series).await;
        }

        let remote = self
            .fetch_remote(&series.remote_id)
            .await
            .map_err(ReconcileError::RemoteFetch)?;
        let inventory = self
            .library
            .inventory(&series.local_id)
            .await
            .map_err(ReconcileError::LocalFetch)?;

        let today = self.clock.today();
        let diff = compute_diff(&remote.seasons, &remote.episodes, &inventory);
        let decision = decide(&DecisionInput {
            remote: &remote.status,
            diff: &diff,
            metadata_complete: metadata_complete(&remote.episodes),
            force_completed: series.force_completed,
            today,
        });

        let mut record = series.clone();
        record.set_state(decision.state, decision.paused_until);
        record.remote_status = remote.status.status.clone();
        record.next_episode = diff.next_episode;
        record.missing_seasons = diff.missing_seasons;
        record.missing_episodes = diff.missing_episodes;
        record.last_checked_at = Some(self.clock.now());

        let persisted = self.repo.update_reconciliation(&record).await;

        // Runs even when the write failed; it only touches library metadata.
        self.patch_metadata(&record, &remote, &inventory).await;

        let Some(stored) = persisted.map_err(ReconcileError::Persistence)? else {
            debug!(local_id = %series.local_id, "Series stopped being tracked mid-reconcile");
            return Ok(ReconcileOutcome::Unchanged);
        };

        // An override applied after this series was read still wins.
        let rule = if stored.force_completed && !series.force_completed {
            DecisionRule::ForceOverride
        } else {
            decision.rule
        };

        let previous = series.lifecycle_state;
        if previous != stored.lifecycle_state {
            info!(
                local_id = %stored.local_id,
                name = %stored.display_name,
                from = %previous,
                to = %stored.lifecycle_state,
                paused_until = ?stored.paused_until,
                rule = %rule,
                "Series state changed"
            );
            self.events.publish(WatchlistEvent::StateChanged {
                local_id: stored.local_id.clone(),
                display_name: stored.display_name.clone(),
                old_state: previous,
                new_state: stored.lifecycle_state,
                paused_until: stored.paused_until,
                timestamp: self.clock.now(),
            });
        } else {
            debug!(
                local_id = %stored.local_id,
                state = %stored.lifecycle_state,
                rule = %rule,
                "Series reconciled"
            );
        }

        Ok(ReconcileOutcome::Updated {
            previous,
            state: stored.lifecycle_state,
            paused_until: stored.paused_until,
            rule,
        })
    }

    async fn remove(&self, series: &TrackedSeries) -> Result<ReconcileOutcome, ReconcileError> {
        self.repo
            .delete_series(&series.local_id)
            .await
            .map_err(ReconcileError::Persistence)?;

        info!(
            local_id = %series.local_id,
            name = %series.display_name,
            "Series no longer in local library, stopped tracking"
        );
        self.events.publish(WatchlistEvent::SeriesRemoved {
            local_id: series.local_id.clone(),
            display_name: series.display_name.clone(),
            timestamp: self.clock.now(),
        });
        Ok(ReconcileOutcome::Removed)
    }

    /// Status, season list and the episodes of every non-special season.
    async fn fetch_remote(&self, remote_id: &str) -> crate::Result<RemoteSeries> {
        let status = self.catalog.series_status(remote_id).await?;
        let seasons: Vec<_> = self
            .catalog
            .season_list(remote_id)
            .await?
            .into_iter()
            .filter(|season| !season.is_special())
            .collect();

        let mut episodes = Vec::new();
        for season in &seasons {
            let season_episodes = self
                .catalog
                .season_episodes(remote_id, season.season_number)
                .await?;
            episodes.extend(season_episodes.into_iter().filter(|ep| !ep.is_special()));
        }

        Ok(RemoteSeries {
            status,
            seasons,
            episodes,
        })
    }

    /// Push remote titles and synopses for local episodes that lack one.
    ///
    /// Returns the number of accepted patches. Failures are logged only.
    async fn patch_metadata(
        &self,
        record: &TrackedSeries,
        remote: &RemoteSeries,
        inventory: &LocalInventory,
    ) -> usize {
        let mut patched = 0;

        for local in inventory.lacking_synopsis() {
            let Some(episode) = remote.episode(local.season_number, local.episode_number) else {
                continue;
            };
            let Some(synopsis) = episode.synopsis.as_deref().filter(|_| episode.has_synopsis())
            else {
                continue;
            };

            let patch = EpisodeMetadataPatch {
                title: episode.title.clone(),
                synopsis: synopsis.to_string(),
            };
            match self
                .library
                .patch_episode_metadata(
                    &record.local_id,
                    local.season_number,
                    local.episode_number,
                    &patch,
                )
                .await
            {
                Ok(true) => patched += 1,
                Ok(false) => warn!(
                    local_id = %record.local_id,
                    season = local.season_number,
                    episode = local.episode_number,
                    "Library declined metadata patch"
                ),
                Err(e) => warn!(
                    local_id = %record.local_id,
                    season = local.season_number,
                    episode = local.episode_number,
                    error = %e,
                    "Failed to patch episode metadata"
                ),
            }
        }

        if patched > 0 {
            debug!(local_id = %record.local_id, count = patched, "Patched episode metadata");
        }
        patched
    }
}
