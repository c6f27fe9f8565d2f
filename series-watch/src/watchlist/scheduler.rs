//! Periodic pass scheduling.
//!
//! The regular pass (followed by acquisition) and the revival pass run on
//! independent cadences. They touch disjoint sets of series, so they are
//! allowed to overlap.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::batch::WorkingSet;
use super::service::WatchlistService;
use crate::config::WatchlistConfig;

pub struct WatchlistScheduler {
    service: Arc<WatchlistService>,
    regular_interval: Duration,
    revival_interval: Duration,
    cancellation_token: CancellationToken,
}

impl WatchlistScheduler {
    pub fn new(
        service: Arc<WatchlistService>,
        config: &WatchlistConfig,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            service,
            regular_interval: config.regular_interval,
            revival_interval: config.revival_interval,
            cancellation_token,
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    /// Run both loops until the token is cancelled. The first passes start
    /// immediately.
    pub async fn run(&self) {
        info!(
            regular_secs = self.regular_interval.as_secs(),
            revival_secs = self.revival_interval.as_secs(),
            "Watchlist scheduler started"
        );
        tokio::join!(self.regular_loop(), self.revival_loop());
        info!("Watchlist scheduler stopped");
    }

    async fn regular_loop(&self) {
        let mut interval = tokio::time::interval(self.regular_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => break,
                _ = interval.tick() => {}
            }

            if let Err(e) = self
                .service
                .run_pass(WorkingSet::Due, &self.cancellation_token)
                .await
            {
                error!(error = %e, "Regular pass failed");
                continue;
            }
            if self.cancellation_token.is_cancelled() {
                break;
            }
            if let Err(e) = self.service.run_acquisition(&self.cancellation_token).await {
                error!(error = %e, "Acquisition pass failed");
            }
        }
    }

    async fn revival_loop(&self) {
        let mut interval = tokio::time::interval(self.revival_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => break,
                _ = interval.tick() => {}
            }

            if let Err(e) = self
                .service
                .run_pass(WorkingSet::Revival, &self.cancellation_token)
                .await
            {
                error!(error = %e, "Revival pass failed");
            }
        }
    }
}
