//! Logging setup with a reloadable filter.
//!
//! - Runtime log level changes via `tracing_subscriber::reload`
//! - Optional daily-rotated log file with retention cleanup
//! - Local timezone timestamps

use chrono::{Local, NaiveDate, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    reload::{self, Handle},
    util::SubscriberInitExt,
};

use crate::config::WatchlistConfig;

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "series_watch=info,sqlx=warn";

/// File name prefix of rotated log files.
const LOG_FILE_PREFIX: &str = "series-watch.log";

/// Log retention period in days.
const LOG_RETENTION_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

pub type FilterHandle = Handle<EnvFilter, tracing_subscriber::Registry>;

/// Handle to the installed subscriber.
pub struct LoggingConfig {
    handle: FilterHandle,
    log_dir: Option<PathBuf>,
}

impl LoggingConfig {
    /// Get the current filter directive string.
    pub fn get_filter(&self) -> String {
        self.handle
            .with_current(|filter| filter.to_string())
            .unwrap_or_default()
    }

    /// Replace the filter directive, e.g. `"series_watch=debug,sqlx=warn"`.
    pub fn set_filter(&self, directive: &str) -> crate::Result<()> {
        let new_filter = EnvFilter::try_new(directive)
            .map_err(|e| crate::Error::config(format!("Invalid filter directive: {}", e)))?;

        self.handle
            .reload(new_filter)
            .map_err(|e| crate::Error::Other(format!("Failed to reload filter: {}", e)))?;

        info!(directive = %directive, "Log filter updated");
        Ok(())
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    /// Delete rotated log files older than the retention period, at start
    /// and then once a day until `cancel_token` fires.
    ///
    /// Returns `None` when logging to the console only.
    pub fn start_retention_cleanup(
        self: &Arc<Self>,
        cancel_token: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        let log_dir = self.log_dir.clone()?;

        Some(tokio::spawn(async move {
            let cleanup_interval = Duration::from_secs(24 * 60 * 60);

            loop {
                if let Err(e) = cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS).await {
                    warn!(error = %e, "Failed to cleanup old logs");
                }

                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        debug!("Log retention cleanup task shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(cleanup_interval) => {}
                }
            }
        }))
    }
}

/// Date suffix of a rotated log file name (`series-watch.log.YYYY-MM-DD`).
fn rotated_log_date(file_name: &str) -> Option<NaiveDate> {
    let date_str = file_name.strip_prefix(LOG_FILE_PREFIX)?.strip_prefix('.')?;
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()
}

/// Delete log files older than the specified number of days.
async fn cleanup_old_logs(log_dir: &Path, retention_days: i64) -> std::io::Result<usize> {
    let cutoff = Utc::now().date_naive() - chrono::Duration::days(retention_days);

    let mut entries = tokio::fs::read_dir(log_dir).await?;
    let mut deleted_count = 0;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(file_date) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(rotated_log_date)
        else {
            continue;
        };

        if file_date < cutoff {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    deleted_count += 1;
                    debug!(path = %path.display(), "Deleted old log file");
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete old log file"),
            }
        }
    }

    if deleted_count > 0 {
        info!(count = deleted_count, "Cleaned up old log files");
    }

    Ok(deleted_count)
}

/// Install the global subscriber.
///
/// The filter comes from `config.log_filter` (`RUST_LOG`), falling back to
/// [`DEFAULT_LOG_FILTER`]. When `config.log_dir` is set, logs are also written
/// to a daily-rotated file; keep the returned guard alive for the app lifetime.
pub fn init_logging(
    config: &WatchlistConfig,
) -> crate::Result<(Arc<LoggingConfig>, Option<WorkerGuard>)> {
    let initial_filter = config
        .log_filter
        .as_deref()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));
    let (filter_layer, filter_handle) = reload::Layer::new(initial_filter);

    let (file_layer, guard) = match &config.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(LocalTimer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_ansi(true).with_timer(LocalTimer))
        .with(file_layer)
        .try_init()
        .map_err(|e| {
            crate::Error::Other(format!("Failed to set global default subscriber: {}", e))
        })?;

    let logging = Arc::new(LoggingConfig {
        handle: filter_handle,
        log_dir: config.log_dir.clone(),
    });

    Ok((logging, guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert!(DEFAULT_LOG_FILTER.contains("series_watch=info"));
        assert!(DEFAULT_LOG_FILTER.contains("sqlx=warn"));
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn test_rotated_log_date() {
        assert_eq!(
            rotated_log_date("series-watch.log.2024-06-01"),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert_eq!(rotated_log_date("series-watch.log"), None);
        assert_eq!(rotated_log_date("other.log.2024-06-01"), None);
        assert_eq!(rotated_log_date("series-watch.log.garbage"), None);
    }

    fn logging_config(
        directive: &str,
        log_dir: Option<PathBuf>,
    ) -> (reload::Layer<EnvFilter, tracing_subscriber::Registry>, Arc<LoggingConfig>) {
        let (layer, handle) = reload::Layer::new(EnvFilter::new(directive));
        let config = Arc::new(LoggingConfig { handle, log_dir });
        (layer, config)
    }

    #[test]
    fn test_set_filter_replaces_directive() {
        let (_layer, logging) = logging_config("series_watch=info", None);
        assert_eq!(logging.get_filter().to_lowercase(), "series_watch=info");

        logging.set_filter("series_watch=debug").unwrap();
        assert_eq!(logging.get_filter().to_lowercase(), "series_watch=debug");
    }

    #[test]
    fn test_set_filter_rejects_invalid_directive() {
        let (_layer, logging) = logging_config("series_watch=info", None);

        let err = logging.set_filter("series_watch=loud").unwrap_err();
        assert!(matches!(err, crate::Error::Configuration(_)));
        assert_eq!(logging.get_filter().to_lowercase(), "series_watch=info");
    }

    #[tokio::test]
    async fn test_retention_cleanup_runs_until_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("series-watch.log.2000-01-01");
        std::fs::write(&old, b"x").unwrap();
        let (_layer, logging) = logging_config("info", Some(dir.path().to_path_buf()));
        let cancel = CancellationToken::new();

        let handle = logging.start_retention_cleanup(cancel.clone()).unwrap();
        cancel.cancel();
        handle.await.unwrap();

        assert!(!old.exists());
    }

    #[test]
    fn test_retention_cleanup_needs_log_dir() {
        let (_layer, logging) = logging_config("info", None);
        assert!(logging.start_retention_cleanup(CancellationToken::new()).is_none());
    }

    #[tokio::test]
    async fn test_cleanup_old_logs() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("series-watch.log.2000-01-01");
        let today = dir
            .path()
            .join(format!("series-watch.log.{}", Utc::now().format("%Y-%m-%d")));
        let unrelated = dir.path().join("notes.txt");
        for path in [&old, &today, &unrelated] {
            std::fs::write(path, b"x").unwrap();
        }

        let deleted = cleanup_old_logs(dir.path(), LOG_RETENTION_DAYS).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(!old.exists());
        assert!(today.exists());
        assert!(unrelated.exists());
    }
}
