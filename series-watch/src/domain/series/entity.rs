//! Tracked series entity.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::LifecycleState;
use crate::database::models::TrackedSeriesDbModel;
use crate::database::time::{
    date_to_text, datetime_to_ms, ms_to_datetime, now_ms, text_to_date,
};
use crate::domain::{EpisodeDescriptor, SeasonDescriptor};
use crate::{Error, Result};

/// A TV series under reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedSeries {
    /// Identifier in the local library. Primary key.
    pub local_id: String,
    /// Identifier in the remote catalog.
    pub remote_id: String,
    pub display_name: String,
    pub lifecycle_state: LifecycleState,
    /// Only meaningful while `Paused`.
    pub paused_until: Option<NaiveDate>,
    /// Last observed remote lifecycle string, verbatim.
    pub remote_status: String,
    pub next_episode: Option<EpisodeDescriptor>,
    pub missing_seasons: Vec<SeasonDescriptor>,
    pub missing_episodes: Vec<EpisodeDescriptor>,
    pub force_completed: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub added_at: DateTime<Utc>,
}

impl TrackedSeries {
    /// Create a new tracked series in the `Watching` state.
    pub fn new(
        local_id: impl Into<String>,
        remote_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            local_id: local_id.into(),
            remote_id: remote_id.into(),
            display_name: display_name.into(),
            lifecycle_state: LifecycleState::Watching,
            paused_until: None,
            remote_status: String::new(),
            next_episode: None,
            missing_seasons: Vec::new(),
            missing_episodes: Vec::new(),
            force_completed: false,
            last_checked_at: None,
            added_at: ms_to_datetime(now_ms()),
        }
    }

    /// Set the remote status.
    pub fn with_remote_status(mut self, status: impl Into<String>) -> Self {
        self.remote_status = status.into();
        self
    }

    /// Set the lifecycle state, clearing `paused_until` unless the new state is `Paused`.
    pub fn set_state(&mut self, state: LifecycleState, paused_until: Option<NaiveDate>) {
        self.lifecycle_state = state;
        self.paused_until = match state {
            LifecycleState::Paused => paused_until,
            _ => None,
        };
    }

    /// Apply the manual "mark finished" override.
    pub fn force_complete(&mut self) {
        self.force_completed = true;
        self.set_state(LifecycleState::Completed, None);
    }

    /// Reactivate a completed series after the remote catalog shows new life.
    ///
    /// This is the only transition that clears `force_completed`.
    pub fn revive(&mut self, remote_status: impl Into<String>) {
        self.remote_status = remote_status.into();
        self.force_completed = false;
        self.set_state(LifecycleState::Watching, None);
    }

    /// Whether the series is paused past `today`.
    pub fn is_paused_on(&self, today: NaiveDate) -> bool {
        self.lifecycle_state == LifecycleState::Paused
            && self.paused_until.is_some_and(|until| until > today)
    }

    /// Whether a regular pass should look at this series on `today`.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.lifecycle_state.is_active() && !self.is_paused_on(today)
    }

    /// Create the entity from its database row.
    pub fn from_db_model(model: &TrackedSeriesDbModel) -> Result<Self> {
        let lifecycle_state = LifecycleState::parse(&model.lifecycle_state).ok_or_else(|| {
            Error::validation(format!(
                "unknown lifecycle state '{}' for series {}",
                model.lifecycle_state, model.local_id
            ))
        })?;

        let next_episode = match model.next_episode.as_deref() {
            Some(json) => Some(serde_json::from_str(json)?),
            None => None,
        };

        let mut series = Self {
            local_id: model.local_id.clone(),
            remote_id: model.remote_id.clone(),
            display_name: model.display_name.clone(),
            lifecycle_state,
            paused_until: None,
            remote_status: model.remote_status.clone(),
            next_episode,
            missing_seasons: serde_json::from_str(&model.missing_seasons)?,
            missing_episodes: serde_json::from_str(&model.missing_episodes)?,
            force_completed: model.force_completed,
            last_checked_at: model.last_checked_at.map(ms_to_datetime),
            added_at: ms_to_datetime(model.added_at),
        };
        series.set_state(
            lifecycle_state,
            model.paused_until.as_deref().and_then(text_to_date),
        );
        Ok(series)
    }

    /// Convert the entity into its database row.
    pub fn to_db_model(&self) -> Result<TrackedSeriesDbModel> {
        let next_episode = match &self.next_episode {
            Some(ep) => Some(serde_json::to_string(ep)?),
            None => None,
        };

        Ok(TrackedSeriesDbModel {
            local_id: self.local_id.clone(),
            remote_id: self.remote_id.clone(),
            display_name: self.display_name.clone(),
            lifecycle_state: self.lifecycle_state.as_str().to_string(),
            paused_until: self.paused_until.map(date_to_text),
            remote_status: self.remote_status.clone(),
            next_episode,
            missing_seasons: serde_json::to_string(&self.missing_seasons)?,
            missing_episodes: serde_json::to_string(&self.missing_episodes)?,
            force_completed: self.force_completed,
            last_checked_at: self.last_checked_at.map(datetime_to_ms),
            added_at: datetime_to_ms(self.added_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_series() -> TrackedSeries {
        TrackedSeries::new("emby-42", "1399", "Test Series").with_remote_status("Returning Series")
    }

    #[test]
    fn test_new_series_defaults() {
        let series = create_test_series();
        assert_eq!(series.lifecycle_state, LifecycleState::Watching);
        assert!(series.paused_until.is_none());
        assert!(!series.force_completed);
        assert!(series.last_checked_at.is_none());
    }

    #[test]
    fn test_set_state_clears_pause_outside_paused() {
        let mut series = create_test_series();
        series.set_state(LifecycleState::Paused, Some(date(2024, 5, 1)));
        assert_eq!(series.paused_until, Some(date(2024, 5, 1)));

        series.set_state(LifecycleState::Watching, Some(date(2024, 5, 1)));
        assert!(series.paused_until.is_none());
    }

    #[test]
    fn test_force_complete_and_revive() {
        let mut series = create_test_series();
        series.set_state(LifecycleState::Paused, Some(date(2024, 5, 1)));

        series.force_complete();
        assert!(series.force_completed);
        assert_eq!(series.lifecycle_state, LifecycleState::Completed);
        assert!(series.paused_until.is_none());

        series.revive("In Production");
        assert!(!series.force_completed);
        assert_eq!(series.lifecycle_state, LifecycleState::Watching);
        assert_eq!(series.remote_status, "In Production");
    }

    #[test]
    fn test_is_due() {
        let today = date(2024, 5, 10);
        let mut series = create_test_series();
        assert!(series.is_due(today));

        series.set_state(LifecycleState::Paused, Some(date(2024, 5, 11)));
        assert!(!series.is_due(today));

        series.set_state(LifecycleState::Paused, Some(today));
        assert!(series.is_due(today));

        series.set_state(LifecycleState::Paused, None);
        assert!(series.is_due(today));

        series.set_state(LifecycleState::Completed, None);
        assert!(!series.is_due(today));
    }

    #[test]
    fn test_db_model_round_trip() {
        let mut series = create_test_series();
        series.set_state(LifecycleState::Paused, Some(date(2024, 7, 1)));
        series.next_episode =
            Some(EpisodeDescriptor::new(2, 3, "Next").with_air_date(date(2024, 7, 2)));
        series.missing_seasons = vec![SeasonDescriptor::new(3, 8)];
        series.missing_episodes = vec![EpisodeDescriptor::new(2, 3, "Next")];
        series.last_checked_at = Some(ms_to_datetime(1_700_000_000_000));
        series.added_at = ms_to_datetime(1_600_000_000_000);

        let model = series.to_db_model().unwrap();
        assert_eq!(model.lifecycle_state, "Paused");
        assert_eq!(model.paused_until.as_deref(), Some("2024-07-01"));

        let restored = TrackedSeries::from_db_model(&model).unwrap();
        assert_eq!(restored, series);
    }

    #[test]
    fn test_from_db_model_rejects_unknown_state() {
        let mut model = create_test_series().to_db_model().unwrap();
        model.lifecycle_state = "Dormant".to_string();
        assert!(matches!(
            TrackedSeries::from_db_model(&model),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_from_db_model_drops_stale_pause_date() {
        let mut model = create_test_series().to_db_model().unwrap();
        model.paused_until = Some("2024-07-01".to_string());
        let restored = TrackedSeries::from_db_model(&model).unwrap();
        assert_eq!(restored.lifecycle_state, LifecycleState::Watching);
        assert!(restored.paused_until.is_none());
    }
}
