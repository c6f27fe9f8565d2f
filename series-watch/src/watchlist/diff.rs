//! Missing-media diff between the remote catalog and the local inventory.

use crate::domain::{EpisodeDescriptor, LocalInventory, SeasonDescriptor};

/// What the local library is missing compared to the remote catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesDiff {
    /// Seasons with no local episodes at all, ascending.
    pub missing_seasons: Vec<SeasonDescriptor>,
    /// Episodes absent from seasons that are otherwise partially present.
    pub missing_episodes: Vec<EpisodeDescriptor>,
    /// First locally missing episode by `(season, episode)`, aired or not.
    pub next_episode: Option<EpisodeDescriptor>,
}

impl SeriesDiff {
    /// Nothing is missing locally.
    pub fn is_complete(&self) -> bool {
        self.missing_seasons.is_empty() && self.missing_episodes.is_empty()
    }
}

/// Compute missing seasons, missing episodes and the next missing episode.
///
/// Specials are ignored. A season with no local entries is reported once in
/// `missing_seasons` and its episodes are not repeated in `missing_episodes`,
/// though they still take part in `next_episode` selection.
pub fn compute_diff(
    seasons: &[SeasonDescriptor],
    episodes: &[EpisodeDescriptor],
    local: &LocalInventory,
) -> SeriesDiff {
    let mut missing_seasons: Vec<SeasonDescriptor> = seasons
        .iter()
        .filter(|season| !season.is_special() && !local.has_season(season.season_number))
        .cloned()
        .collect();
    missing_seasons.sort_by_key(|season| season.season_number);
    missing_seasons.dedup_by_key(|season| season.season_number);

    let mut missing: Vec<&EpisodeDescriptor> = episodes
        .iter()
        .filter(|ep| !ep.is_special() && !local.contains(ep.season_number, ep.episode_number))
        .collect();
    missing.sort_by_key(|ep| ep.key());
    missing.dedup_by_key(|ep| ep.key());

    let next_episode = missing.first().map(|ep| (*ep).clone());

    let missing_episodes = missing
        .into_iter()
        .filter(|ep| local.has_season(ep.season_number))
        .cloned()
        .collect();

    SeriesDiff {
        missing_seasons,
        missing_episodes,
        next_episode,
    }
}
