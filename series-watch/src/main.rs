use tokio_util::sync::CancellationToken;

use series_watch::config::WatchlistConfig;
use series_watch::database::repositories::{SqlxTrackedSeriesRepository, TrackedSeriesRepository};
use series_watch::database::{init_pool, run_migrations};
use series_watch::domain::LifecycleState;
use series_watch::logging;

#[tokio::main]
async fn main() -> series_watch::Result<()> {
    let config = WatchlistConfig::from_env()?;
    let (logging, _guard) = logging::init_logging(&config)?;

    let cancel_token = CancellationToken::new();
    let cleanup = logging.start_retention_cleanup(cancel_token.clone());

    let pool = init_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let repo = SqlxTrackedSeriesRepository::new(pool);
    let series = repo.list_all_series().await?;

    for state in LifecycleState::all() {
        let count = series.iter().filter(|s| s.lifecycle_state == state).count();
        tracing::info!(state = %state, count, "Tracked series");
    }
    for s in series.iter().filter(|s| s.lifecycle_state == LifecycleState::Paused) {
        tracing::info!(
            local_id = %s.local_id,
            name = %s.display_name,
            paused_until = ?s.paused_until,
            "Paused"
        );
    }

    tracing::info!(total = series.len(), "series-watch database ready");

    cancel_token.cancel();
    if let Some(cleanup) = cleanup
        && let Err(e) = cleanup.await
    {
        tracing::warn!(error = %e, "Log retention cleanup task failed");
    }
    Ok(())
}
