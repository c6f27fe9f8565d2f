//! Daily acquisition quota repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::Result;
use crate::database::models::AcquisitionQuotaDbModel;
use crate::database::retry::retry_on_sqlite_busy;
use crate::database::time::date_to_text;

/// Persistent per-day budget of acquisition requests.
#[async_trait]
pub trait AcquisitionQuotaRepository: Send + Sync {
    /// Requests left on `today` under `daily_cap`. A new day resets the budget.
    async fn remaining_quota(&self, today: NaiveDate, daily_cap: usize) -> Result<usize>;
    /// Spend one request of the budget for `today`. Returns false when none was left.
    async fn consume_quota(&self, today: NaiveDate) -> Result<bool>;
}

/// SQLx implementation of AcquisitionQuotaRepository.
pub struct SqlxAcquisitionQuotaRepository {
    pool: SqlitePool,
}

impl SqlxAcquisitionQuotaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn store(&self, row: &AcquisitionQuotaDbModel) -> Result<()> {
        retry_on_sqlite_busy("store_acquisition_quota", || async {
            sqlx::query(
                r#"
                INSERT INTO acquisition_quota (id, quota_date, daily_cap, remaining)
                VALUES (1, ?, ?, ?)
                ON CONFLICT (id) DO UPDATE SET
                    quota_date = excluded.quota_date,
                    daily_cap = excluded.daily_cap,
                    remaining = excluded.remaining
                "#,
            )
            .bind(&row.quota_date)
            .bind(row.daily_cap)
            .bind(row.remaining)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl AcquisitionQuotaRepository for SqlxAcquisitionQuotaRepository {
    async fn remaining_quota(&self, today: NaiveDate, daily_cap: usize) -> Result<usize> {
        let stored = sqlx::query_as::<_, AcquisitionQuotaDbModel>(
            "SELECT quota_date, daily_cap, remaining FROM acquisition_quota WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let current = match &stored {
            Some(row) => row.rebased(today, daily_cap),
            None => AcquisitionQuotaDbModel::fresh(today, daily_cap),
        };

        if stored.as_ref() != Some(&current) {
            if stored.as_ref().is_none_or(|row| row.quota_date != current.quota_date) {
                info!(date = %current.quota_date, daily_cap, "Acquisition quota reset");
            } else {
                debug!(remaining = current.remaining, daily_cap, "Acquisition quota rebased");
            }
            self.store(&current).await?;
        }

        Ok(current.remaining.max(0) as usize)
    }

    async fn consume_quota(&self, today: NaiveDate) -> Result<bool> {
        let date = date_to_text(today);
        retry_on_sqlite_busy("consume_quota", || async {
            let result = sqlx::query(
                r#"
                UPDATE acquisition_quota SET remaining = remaining - 1
                WHERE id = 1 AND quota_date = ? AND remaining > 0
                "#,
            )
            .bind(&date)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }
}
