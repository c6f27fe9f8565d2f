//! Tracked series repository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::warn;

use crate::Result;
use crate::database::models::TrackedSeriesDbModel;
use crate::database::retry::retry_on_sqlite_busy;
use crate::domain::{LifecycleState, SeasonDescriptor, TrackedSeries};

/// Keyed record store for tracked series.
///
/// Every write touches a single row keyed by `local_id`, so callers never
/// need a transaction spanning several series.
#[async_trait]
pub trait TrackedSeriesRepository: Send + Sync {
    async fn get_series(&self, local_id: &str) -> Result<Option<TrackedSeries>>;
    async fn list_series_by_state(&self, state: LifecycleState) -> Result<Vec<TrackedSeries>>;
    async fn list_all_series(&self) -> Result<Vec<TrackedSeries>>;
    /// Insert or fully replace a record. `added_at` of an existing row is kept.
    ///
    /// Only for transitions that own `force_completed` (the manual override
    /// and revival).
    async fn upsert_series(&self, series: &TrackedSeries) -> Result<()>;
    /// Store the outcome of a reconciliation.
    ///
    /// Writes the lifecycle state, pause date, remote status, next episode,
    /// missing lists and `last_checked_at`. `force_completed` is never
    /// written; a row carrying it stays Completed with no pause date. Returns
    /// the stored record, or `None` when the row no longer exists.
    async fn update_reconciliation(&self, series: &TrackedSeries)
    -> Result<Option<TrackedSeries>>;
    /// Replace only the missing season list. Returns whether the row exists.
    async fn update_missing_seasons(
        &self,
        local_id: &str,
        seasons: &[SeasonDescriptor],
    ) -> Result<bool>;
    /// Insert a record unless one already exists. Returns whether a row was added.
    async fn insert_series_if_absent(&self, series: &TrackedSeries) -> Result<bool>;
    /// Delete a record. Returns whether a row existed.
    async fn delete_series(&self, local_id: &str) -> Result<bool>;
}

/// SQLx implementation of TrackedSeriesRepository.
pub struct SqlxTrackedSeriesRepository {
    pool: SqlitePool,
}

impl SqlxTrackedSeriesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Decode rows, skipping any that cannot be decoded.
    fn decode_rows(rows: Vec<TrackedSeriesDbModel>) -> Vec<TrackedSeries> {
        rows.iter()
            .filter_map(|row| match TrackedSeries::from_db_model(row) {
                Ok(series) => Some(series),
                Err(e) => {
                    warn!(local_id = %row.local_id, error = %e, "Skipping undecodable tracked series row");
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl TrackedSeriesRepository for SqlxTrackedSeriesRepository {
    async fn get_series(&self, local_id: &str) -> Result<Option<TrackedSeries>> {
        let row = sqlx::query_as::<_, TrackedSeriesDbModel>(
            "SELECT * FROM tracked_series WHERE local_id = ?",
        )
        .bind(local_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(TrackedSeries::from_db_model).transpose()
    }

    async fn list_series_by_state(&self, state: LifecycleState) -> Result<Vec<TrackedSeries>> {
        let rows = sqlx::query_as::<_, TrackedSeriesDbModel>(
            "SELECT * FROM tracked_series WHERE lifecycle_state = ? ORDER BY added_at DESC, local_id",
        )
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(Self::decode_rows(rows))
    }

    async fn list_all_series(&self) -> Result<Vec<TrackedSeries>> {
        let rows = sqlx::query_as::<_, TrackedSeriesDbModel>(
            "SELECT * FROM tracked_series ORDER BY added_at DESC, local_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(Self::decode_rows(rows))
    }

    async fn upsert_series(&self, series: &TrackedSeries) -> Result<()> {
        let model = series.to_db_model()?;

        retry_on_sqlite_busy("upsert_series", || async {
            sqlx::query(
                r#"
                INSERT INTO tracked_series (
                    local_id, remote_id, display_name, lifecycle_state, paused_until,
                    remote_status, next_episode, missing_seasons, missing_episodes,
                    force_completed, last_checked_at, added_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (local_id) DO UPDATE SET
                    remote_id = excluded.remote_id,
                    display_name = excluded.display_name,
                    lifecycle_state = excluded.lifecycle_state,
                    paused_until = excluded.paused_until,
                    remote_status = excluded.remote_status,
                    next_episode = excluded.next_episode,
                    missing_seasons = excluded.missing_seasons,
                    missing_episodes = excluded.missing_episodes,
                    force_completed = excluded.force_completed,
                    last_checked_at = excluded.last_checked_at
                "#,
            )
            .bind(&model.local_id)
            .bind(&model.remote_id)
            .bind(&model.display_name)
            .bind(&model.lifecycle_state)
            .bind(&model.paused_until)
            .bind(&model.remote_status)
            .bind(&model.next_episode)
            .bind(&model.missing_seasons)
            .bind(&model.missing_episodes)
            .bind(model.force_completed)
            .bind(model.last_checked_at)
            .bind(model.added_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    async fn update_reconciliation(
        &self,
        series: &TrackedSeries,
    ) -> Result<Option<TrackedSeries>> {
        let model = series.to_db_model()?;

        let updated = retry_on_sqlite_busy("update_reconciliation", || async {
            let result = sqlx::query(
                r#"
                UPDATE tracked_series SET
                    lifecycle_state = CASE WHEN force_completed THEN 'Completed' ELSE ? END,
                    paused_until = CASE WHEN force_completed THEN NULL ELSE ? END,
                    remote_status = ?,
                    next_episode = ?,
                    missing_seasons = ?,
                    missing_episodes = ?,
                    last_checked_at = ?
                WHERE local_id = ?
                "#,
            )
            .bind(&model.lifecycle_state)
            .bind(&model.paused_until)
            .bind(&model.remote_status)
            .bind(&model.next_episode)
            .bind(&model.missing_seasons)
            .bind(&model.missing_episodes)
            .bind(model.last_checked_at)
            .bind(&model.local_id)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() > 0)
        })
        .await?;

        if !updated {
            return Ok(None);
        }
        self.get_series(&series.local_id).await
    }

    async fn update_missing_seasons(
        &self,
        local_id: &str,
        seasons: &[SeasonDescriptor],
    ) -> Result<bool> {
        let json = serde_json::to_string(seasons)?;

        retry_on_sqlite_busy("update_missing_seasons", || async {
            let result =
                sqlx::query("UPDATE tracked_series SET missing_seasons = ? WHERE local_id = ?")
                    .bind(&json)
                    .bind(local_id)
                    .execute(&self.pool)
                    .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn insert_series_if_absent(&self, series: &TrackedSeries) -> Result<bool> {
        let model = series.to_db_model()?;

        retry_on_sqlite_busy("insert_series_if_absent", || async {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO tracked_series (
                    local_id, remote_id, display_name, lifecycle_state, paused_until,
                    remote_status, next_episode, missing_seasons, missing_episodes,
                    force_completed, last_checked_at, added_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&model.local_id)
            .bind(&model.remote_id)
            .bind(&model.display_name)
            .bind(&model.lifecycle_state)
            .bind(&model.paused_until)
            .bind(&model.remote_status)
            .bind(&model.next_episode)
            .bind(&model.missing_seasons)
            .bind(&model.missing_episodes)
            .bind(model.force_completed)
            .bind(model.last_checked_at)
            .bind(model.added_at)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn delete_series(&self, local_id: &str) -> Result<bool> {
        retry_on_sqlite_busy("delete_series", || async {
            let result = sqlx::query("DELETE FROM tracked_series WHERE local_id = ?")
                .bind(local_id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }
}
