//! Remote catalog value objects.
//!
//! Descriptors for seasons and episodes as reported by the authoritative
//! remote catalog, plus the series-level lifecycle status.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Season number reserved for specials. Never part of any diff.
pub const SPECIALS_SEASON: u32 = 0;

/// Remote status strings that mean the series will not produce new episodes.
const TERMINAL_STATUSES: &[&str] = &["ended", "canceled", "cancelled"];

/// A single episode as described by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeDescriptor {
    pub season_number: u32,
    pub episode_number: u32,
    pub air_date: Option<NaiveDate>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
}

impl EpisodeDescriptor {
    /// Create an episode descriptor with no air date and no synopsis.
    pub fn new(season_number: u32, episode_number: u32, title: impl Into<String>) -> Self {
        Self {
            season_number,
            episode_number,
            air_date: None,
            title: title.into(),
            synopsis: None,
        }
    }

    /// Set the air date.
    pub fn with_air_date(mut self, air_date: NaiveDate) -> Self {
        self.air_date = Some(air_date);
        self
    }

    /// Set the synopsis.
    pub fn with_synopsis(mut self, synopsis: impl Into<String>) -> Self {
        self.synopsis = Some(synopsis.into());
        self
    }

    /// Whether the catalog carries a usable synopsis for this episode.
    pub fn has_synopsis(&self) -> bool {
        self.synopsis
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    /// Whether this episode belongs to the specials season.
    pub fn is_special(&self) -> bool {
        self.season_number == SPECIALS_SEASON
    }

    /// `(season, episode)` ordering key.
    pub fn key(&self) -> (u32, u32) {
        (self.season_number, self.episode_number)
    }
}

/// A season as described by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonDescriptor {
    pub season_number: u32,
    pub episode_count: u32,
    pub air_date: Option<NaiveDate>,
}

impl SeasonDescriptor {
    pub fn new(season_number: u32, episode_count: u32) -> Self {
        Self {
            season_number,
            episode_count,
            air_date: None,
        }
    }

    pub fn with_air_date(mut self, air_date: NaiveDate) -> Self {
        self.air_date = Some(air_date);
        self
    }

    pub fn is_special(&self) -> bool {
        self.season_number == SPECIALS_SEASON
    }

    /// Whether the season has started airing on or before `today`.
    pub fn has_aired(&self, today: NaiveDate) -> bool {
        self.air_date.is_some_and(|date| date <= today)
    }
}

/// Airing information used by the season-finale heuristic.
///
/// Not every catalog exposes "last aired" / "next to air" fields; a source
/// that cannot supply them reports `Unsupported` so the heuristic is skipped
/// instead of evaluated against missing data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FinaleSignal {
    #[default]
    Unsupported,
    Reported {
        last_aired: Option<EpisodeDescriptor>,
        next_to_air: Option<EpisodeDescriptor>,
    },
}

impl FinaleSignal {
    /// True when the most recent episode has aired and nothing further is announced.
    pub fn finale_aired(&self, today: NaiveDate) -> bool {
        match self {
            Self::Unsupported => false,
            Self::Reported {
                last_aired,
                next_to_air,
            } => {
                let aired = last_aired
                    .as_ref()
                    .and_then(|ep| ep.air_date)
                    .is_some_and(|date| date <= today);
                aired && next_to_air.is_none()
            }
        }
    }

    /// True when the catalog announces an upcoming episode.
    pub fn announces_next_episode(&self) -> bool {
        matches!(
            self,
            Self::Reported {
                next_to_air: Some(_),
                ..
            }
        )
    }
}

/// Series-level status as reported by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesStatus {
    /// Free-text lifecycle string, stored verbatim.
    pub status: String,
    pub finale: FinaleSignal,
}

impl SeriesStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            finale: FinaleSignal::Unsupported,
        }
    }

    pub fn with_finale(
        mut self,
        last_aired: Option<EpisodeDescriptor>,
        next_to_air: Option<EpisodeDescriptor>,
    ) -> Self {
        self.finale = FinaleSignal::Reported {
            last_aired,
            next_to_air,
        };
        self
    }

    pub fn is_terminal(&self) -> bool {
        is_terminal_status(&self.status)
    }
}

/// Check whether a remote status string means the series is over.
pub fn is_terminal_status(status: &str) -> bool {
    let status = status.trim();
    TERMINAL_STATUSES
        .iter()
        .any(|&s| s.eq_ignore_ascii_case(status))
}

/// Full remote view of one series, specials already removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSeries {
    pub status: SeriesStatus,
    pub seasons: Vec<SeasonDescriptor>,
    pub episodes: Vec<EpisodeDescriptor>,
}

impl RemoteSeries {
    /// Find an episode by its `(season, episode)` key.
    pub fn episode(&self, season_number: u32, episode_number: u32) -> Option<&EpisodeDescriptor> {
        self.episodes
            .iter()
            .find(|ep| ep.season_number == season_number && ep.episode_number == episode_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_terminal_status_is_case_insensitive() {
        assert!(is_terminal_status("Ended"));
        assert!(is_terminal_status("canceled"));
        assert!(is_terminal_status(" Cancelled "));
        assert!(!is_terminal_status("Returning Series"));
        assert!(!is_terminal_status("In Production"));
        assert!(!is_terminal_status(""));
    }

    #[test]
    fn test_has_synopsis_ignores_whitespace() {
        let ep = EpisodeDescriptor::new(1, 1, "Pilot");
        assert!(!ep.has_synopsis());
        assert!(!ep.clone().with_synopsis("   ").has_synopsis());
        assert!(ep.with_synopsis("It begins.").has_synopsis());
    }

    #[test]
    fn test_finale_unsupported_never_holds() {
        assert!(!FinaleSignal::Unsupported.finale_aired(date(2024, 1, 1)));
    }

    #[test]
    fn test_finale_aired_requires_no_next_episode() {
        let today = date(2024, 6, 1);
        let last = EpisodeDescriptor::new(2, 10, "Finale").with_air_date(date(2024, 5, 20));
        let next = EpisodeDescriptor::new(3, 1, "Premiere").with_air_date(date(2025, 1, 1));

        let done = SeriesStatus::new("Returning Series").with_finale(Some(last.clone()), None);
        assert!(done.finale.finale_aired(today));

        let renewed = SeriesStatus::new("Returning Series").with_finale(Some(last), Some(next));
        assert!(!renewed.finale.finale_aired(today));
        assert!(renewed.finale.announces_next_episode());
    }

    #[test]
    fn test_finale_not_aired_when_last_episode_is_in_future() {
        let today = date(2024, 6, 1);
        let last = EpisodeDescriptor::new(1, 8, "Finale").with_air_date(date(2024, 6, 2));
        let status = SeriesStatus::new("Returning Series").with_finale(Some(last), None);
        assert!(!status.finale.finale_aired(today));
    }

    #[test]
    fn test_season_has_aired() {
        let season = SeasonDescriptor::new(2, 10).with_air_date(date(2024, 3, 1));
        assert!(season.has_aired(date(2024, 3, 1)));
        assert!(!season.has_aired(date(2024, 2, 28)));
        assert!(!SeasonDescriptor::new(3, 0).has_aired(date(2030, 1, 1)));
    }
}
