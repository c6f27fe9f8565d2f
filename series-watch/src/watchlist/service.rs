//! Watchlist service.
//!
//! Entry point tying the record store, the collaborators and the passes
//! together. Holds no per-series state of its own.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::acquisition::{AcquisitionPass, AcquisitionReport};
use super::batch::{BatchDriver, BatchReport, WorkingSet};
use super::clock::{Clock, SystemClock};
use super::events::{WatchlistEvent, WatchlistEventBroadcaster};
use super::reconciler::SeriesReconciler;
use super::revival::RevivalCheck;
use crate::clients::{AcquisitionTrigger, LocalLibrary, RemoteCatalog};
use crate::config::WatchlistConfig;
use crate::database::repositories::{AcquisitionQuotaRepository, TrackedSeriesRepository};
use crate::domain::TrackedSeries;
use crate::{Error, Result};

/// Result of registering a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Added,
    AlreadyTracked,
    /// The remote catalog reports the series as over; not tracked.
    Skipped { status: String },
}

pub struct WatchlistService {
    repo: Arc<dyn TrackedSeriesRepository>,
    quota: Arc<dyn AcquisitionQuotaRepository>,
    library: Arc<dyn LocalLibrary>,
    catalog: Arc<dyn RemoteCatalog>,
    trigger: Arc<dyn AcquisitionTrigger>,
    clock: Arc<dyn Clock>,
    events: WatchlistEventBroadcaster,
    max_concurrency: usize,
    acquisition_quota: Option<usize>,
}

impl WatchlistService {
    pub fn new(
        repo: Arc<dyn TrackedSeriesRepository>,
        quota: Arc<dyn AcquisitionQuotaRepository>,
        library: Arc<dyn LocalLibrary>,
        catalog: Arc<dyn RemoteCatalog>,
        trigger: Arc<dyn AcquisitionTrigger>,
        config: &WatchlistConfig,
    ) -> Self {
        Self {
            repo,
            quota,
            library,
            catalog,
            trigger,
            clock: Arc::new(SystemClock),
            events: WatchlistEventBroadcaster::new(),
            max_concurrency: config.max_concurrency,
            acquisition_quota: config.acquisition_quota(),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Subscribe to watchlist events.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchlistEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &WatchlistEventBroadcaster {
        &self.events
    }

    fn driver(&self) -> BatchDriver {
        let reconciler = SeriesReconciler::new(
            self.repo.clone(),
            self.library.clone(),
            self.catalog.clone(),
            self.clock.clone(),
            self.events.clone(),
        );
        let revival = RevivalCheck::new(
            self.repo.clone(),
            self.catalog.clone(),
            self.clock.clone(),
            self.events.clone(),
        );
        BatchDriver::new(
            self.repo.clone(),
            reconciler,
            revival,
            self.clock.clone(),
            self.events.clone(),
        )
        .with_max_concurrency(self.max_concurrency)
    }

    /// Start tracking a series the library holds.
    ///
    /// Series the remote catalog already reports as over are not tracked.
    pub async fn register_series(
        &self,
        local_id: &str,
        remote_id: &str,
        display_name: &str,
    ) -> Result<Registration> {
        if local_id.trim().is_empty() || remote_id.trim().is_empty() {
            return Err(Error::validation("local_id and remote_id must not be empty"));
        }
        if self.repo.get_series(local_id).await?.is_some() {
            return Ok(Registration::AlreadyTracked);
        }

        let status = self.catalog.series_status(remote_id).await?;
        if status.is_terminal() {
            info!(local_id, name = display_name, status = %status.status, "Series already over, not tracking");
            return Ok(Registration::Skipped {
                status: status.status,
            });
        }

        let series = TrackedSeries::new(local_id, remote_id, display_name)
            .with_remote_status(status.status);
        if !self.repo.insert_series_if_absent(&series).await? {
            return Ok(Registration::AlreadyTracked);
        }

        info!(local_id, remote_id, name = display_name, "Started tracking series");
        Ok(Registration::Added)
    }

    /// Apply the manual "mark finished" override. Unknown ids are ignored.
    ///
    /// Returns the number of records updated.
    pub async fn force_complete(&self, local_ids: &[String]) -> Result<usize> {
        let mut updated = 0;

        for local_id in local_ids {
            let Some(series) = self.repo.get_series(local_id).await? else {
                debug!(local_id = %local_id, "Not tracked, cannot force complete");
                continue;
            };

            let mut record = series.clone();
            record.force_complete();
            self.repo.upsert_series(&record).await?;
            updated += 1;

            if series.lifecycle_state != record.lifecycle_state {
                self.events.publish(WatchlistEvent::StateChanged {
                    local_id: record.local_id.clone(),
                    display_name: record.display_name.clone(),
                    old_state: series.lifecycle_state,
                    new_state: record.lifecycle_state,
                    paused_until: None,
                    timestamp: self.clock.now(),
                });
            }
        }

        info!(requested = local_ids.len(), updated, "Force completed series");
        Ok(updated)
    }

    /// Stop tracking a series. Returns whether it was tracked.
    pub async fn remove_series(&self, local_id: &str) -> Result<bool> {
        let removed = self.repo.delete_series(local_id).await?;
        if removed {
            info!(local_id, "Stopped tracking series");
        }
        Ok(removed)
    }

    /// All tracked series, newest first.
    pub async fn list_series(&self) -> Result<Vec<TrackedSeries>> {
        self.repo.list_all_series().await
    }

    pub async fn get_series(&self, local_id: &str) -> Result<TrackedSeries> {
        self.repo
            .get_series(local_id)
            .await?
            .ok_or_else(|| Error::not_found("TrackedSeries", local_id))
    }

    /// Run a reconciliation pass over a working set.
    pub async fn run_pass(&self, set: WorkingSet, cancel: &CancellationToken) -> Result<BatchReport> {
        self.driver().run(set, cancel).await
    }

    /// Reconcile one series on demand.
    pub async fn reconcile_series(
        &self,
        local_id: &str,
        cancel: &CancellationToken,
    ) -> Result<BatchReport> {
        if self.repo.get_series(local_id).await?.is_none() {
            return Err(Error::not_found("TrackedSeries", local_id));
        }
        self.run_pass(WorkingSet::Single(local_id.to_string()), cancel)
            .await
    }

    /// Request aired missing seasons from the acquisition service, within
    /// today's remaining quota.
    pub async fn run_acquisition(&self, cancel: &CancellationToken) -> Result<AcquisitionReport> {
        AcquisitionPass::new(
            self.repo.clone(),
            self.quota.clone(),
            self.trigger.clone(),
            self.clock.clone(),
        )
        .run(self.acquisition_quota, cancel)
        .await
    }
}
