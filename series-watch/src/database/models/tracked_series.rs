//! Tracked series database model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `tracked_series` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TrackedSeriesDbModel {
    pub local_id: String,
    pub remote_id: String,
    pub display_name: String,
    /// Lifecycle state (Watching, Paused, Completed).
    pub lifecycle_state: String,
    /// `YYYY-MM-DD`; set only while paused.
    pub paused_until: Option<String>,
    pub remote_status: String,
    /// JSON-encoded next missing episode.
    pub next_episode: Option<String>,
    /// JSON array of missing seasons.
    pub missing_seasons: String,
    /// JSON array of missing episodes.
    pub missing_episodes: String,
    pub force_completed: bool,
    /// Unix epoch milliseconds (UTC) of the last successful reconciliation.
    pub last_checked_at: Option<i64>,
    /// Unix epoch milliseconds (UTC) when the series was registered.
    pub added_at: i64,
}
