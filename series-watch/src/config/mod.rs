//! Runtime configuration.
//!
//! Settings come from environment variables, optionally seeded from a `.env`
//! file. Unset variables fall back to defaults; malformed ones are errors.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::watchlist::DEFAULT_MAX_CONCURRENCY;
use crate::{Error, Result};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:series-watch.db?mode=rwc";

/// Regular pass cadence: six hours.
pub const DEFAULT_REGULAR_INTERVAL_SECS: u64 = 6 * 60 * 60;

/// Revival pass cadence: one week.
pub const DEFAULT_REVIVAL_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchlistConfig {
    pub database_url: String,
    /// Worker pool width for reconciliation passes.
    pub max_concurrency: usize,
    pub regular_interval: Duration,
    pub revival_interval: Duration,
    /// Acquisition requests per calendar day, 0 for unlimited.
    pub acquisition_quota: usize,
    /// Directory for rotated log files. Console only when unset.
    pub log_dir: Option<PathBuf>,
    /// Filter directive overriding the default log filter.
    pub log_filter: Option<String>,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            regular_interval: Duration::from_secs(DEFAULT_REGULAR_INTERVAL_SECS),
            revival_interval: Duration::from_secs(DEFAULT_REVIVAL_INTERVAL_SECS),
            acquisition_quota: 0,
            log_dir: None,
            log_filter: None,
        }
    }
}

impl WatchlistConfig {
    /// Load configuration from the process environment.
    ///
    /// Supported env vars:
    /// - `DATABASE_URL`
    /// - `WATCHLIST_MAX_CONCURRENCY`
    /// - `WATCHLIST_REGULAR_INTERVAL_SECS`
    /// - `WATCHLIST_REVIVAL_INTERVAL_SECS`
    /// - `WATCHLIST_ACQUISITION_QUOTA`
    /// - `LOG_DIR`
    /// - `RUST_LOG`
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(value) = get("WATCHLIST_MAX_CONCURRENCY") {
            config.max_concurrency = parse_number("WATCHLIST_MAX_CONCURRENCY", &value)?;
        }
        if let Some(value) = get("WATCHLIST_REGULAR_INTERVAL_SECS") {
            config.regular_interval =
                Duration::from_secs(parse_number("WATCHLIST_REGULAR_INTERVAL_SECS", &value)?);
        }
        if let Some(value) = get("WATCHLIST_REVIVAL_INTERVAL_SECS") {
            config.revival_interval =
                Duration::from_secs(parse_number("WATCHLIST_REVIVAL_INTERVAL_SECS", &value)?);
        }
        if let Some(value) = get("WATCHLIST_ACQUISITION_QUOTA") {
            config.acquisition_quota = parse_number("WATCHLIST_ACQUISITION_QUOTA", &value)?;
        }
        config.log_dir = get("LOG_DIR").map(PathBuf::from);
        config.log_filter = get("RUST_LOG");

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(Error::config("WATCHLIST_MAX_CONCURRENCY must be at least 1"));
        }
        if self.regular_interval.is_zero() {
            return Err(Error::config("WATCHLIST_REGULAR_INTERVAL_SECS must be positive"));
        }
        if self.revival_interval.is_zero() {
            return Err(Error::config("WATCHLIST_REVIVAL_INTERVAL_SECS must be positive"));
        }
        Ok(())
    }

    /// The daily acquisition cap, `None` when unlimited.
    pub fn acquisition_quota(&self) -> Option<usize> {
        (self.acquisition_quota > 0).then_some(self.acquisition_quota)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| Error::config(format!("{} is not a valid number: {:?}", key, value)))
}
