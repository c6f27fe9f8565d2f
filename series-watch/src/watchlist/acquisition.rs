//! Acquisition pass.
//!
//! Asks the downstream acquisition service for whole seasons that have aired
//! but are absent locally. Runs after reconciliation has refreshed
//! `missing_seasons`; the reconciler itself never triggers acquisition.
//! An optional daily cap limits the requests sent per calendar day across
//! every run of that day.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::clock::Clock;
use crate::Result;
use crate::clients::AcquisitionTrigger;
use crate::database::repositories::{AcquisitionQuotaRepository, TrackedSeriesRepository};
use crate::domain::TrackedSeries;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionReport {
    /// Series with at least one eligible season.
    pub series: usize,
    pub requested: usize,
    pub failed: usize,
    pub quota_exhausted: bool,
    pub cancelled: bool,
}

pub struct AcquisitionPass {
    repo: Arc<dyn TrackedSeriesRepository>,
    quota: Arc<dyn AcquisitionQuotaRepository>,
    trigger: Arc<dyn AcquisitionTrigger>,
    clock: Arc<dyn Clock>,
}

impl AcquisitionPass {
    pub fn new(
        repo: Arc<dyn TrackedSeriesRepository>,
        quota: Arc<dyn AcquisitionQuotaRepository>,
        trigger: Arc<dyn AcquisitionTrigger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            quota,
            trigger,
            clock,
        }
    }

    /// Request every aired missing season of active series.
    ///
    /// `daily_cap` bounds the requests sent today, counting earlier runs of
    /// the same day; `None` is unlimited. Requests are sent one at a time.
    pub async fn run(
        &self,
        daily_cap: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<AcquisitionReport> {
        let today = self.clock.today();
        let candidates: Vec<TrackedSeries> = self
            .repo
            .list_all_series()
            .await?
            .into_iter()
            .filter(|s| s.lifecycle_state.is_active())
            .filter(|s| s.missing_seasons.iter().any(|season| season.has_aired(today)))
            .collect();

        let mut report = AcquisitionReport {
            series: candidates.len(),
            ..AcquisitionReport::default()
        };
        if candidates.is_empty() {
            debug!("No seasons to acquire");
            return Ok(report);
        }

        let mut remaining = match daily_cap {
            Some(cap) => Some(self.quota.remaining_quota(today, cap).await?),
            None => None,
        };

        'series: for series in candidates {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let mut acquired = Vec::new();

            for season in series.missing_seasons.iter().filter(|s| s.has_aired(today)) {
                if remaining == Some(0) {
                    report.quota_exhausted = true;
                    self.save(&series, &acquired).await;
                    break 'series;
                }

                match self
                    .trigger
                    .request_acquisition(&series.remote_id, Some(season.season_number))
                    .await
                {
                    Ok(true) => {
                        report.requested += 1;
                        acquired.push(season.season_number);
                        if let Some(n) = remaining.as_mut() {
                            *n -= 1;
                            if let Err(e) = self.quota.consume_quota(today).await {
                                warn!(error = %e, "Failed to record spent acquisition quota");
                            }
                        }
                        debug!(
                            local_id = %series.local_id,
                            season = season.season_number,
                            "Requested season acquisition"
                        );
                    }
                    Ok(false) => {
                        report.failed += 1;
                        warn!(
                            local_id = %series.local_id,
                            season = season.season_number,
                            "Acquisition request declined"
                        );
                    }
                    Err(e) => {
                        report.failed += 1;
                        warn!(
                            local_id = %series.local_id,
                            season = season.season_number,
                            error = %e,
                            "Acquisition request failed"
                        );
                    }
                }
            }

            self.save(&series, &acquired).await;
        }

        info!(
            series = report.series,
            requested = report.requested,
            failed = report.failed,
            quota_exhausted = report.quota_exhausted,
            quota_left = ?remaining,
            "Acquisition pass finished"
        );
        Ok(report)
    }

    /// Drop requested seasons from the stored missing list. Failures are
    /// logged; the next reconciliation recomputes the list anyway.
    async fn save(&self, series: &TrackedSeries, acquired: &[u32]) {
        if acquired.is_empty() {
            return;
        }
        let left: Vec<_> = series
            .missing_seasons
            .iter()
            .filter(|season| !acquired.contains(&season.season_number))
            .cloned()
            .collect();

        match self.repo.update_missing_seasons(&series.local_id, &left).await {
            Ok(true) => {}
            Ok(false) => debug!(local_id = %series.local_id, "Series no longer tracked"),
            Err(e) => {
                warn!(local_id = %series.local_id, error = %e, "Failed to store acquired seasons")
            }
        }
    }
}
