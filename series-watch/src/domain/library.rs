//! Local library value objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One episode held by the local library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalEpisode {
    pub season_number: u32,
    pub episode_number: u32,
    pub has_synopsis: bool,
}

impl LocalEpisode {
    pub fn new(season_number: u32, episode_number: u32, has_synopsis: bool) -> Self {
        Self {
            season_number,
            episode_number,
            has_synopsis,
        }
    }
}

/// The set of episodes currently held locally for one series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalInventory {
    episodes: BTreeMap<(u32, u32), LocalEpisode>,
}

impl LocalInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an inventory from the episodes reported by the library.
    ///
    /// Duplicate `(season, episode)` entries collapse; an entry with a
    /// synopsis wins over one without.
    pub fn from_episodes(episodes: impl IntoIterator<Item = LocalEpisode>) -> Self {
        let mut inventory = Self::new();
        for episode in episodes {
            inventory.insert(episode);
        }
        inventory
    }

    pub fn insert(&mut self, episode: LocalEpisode) {
        self.episodes
            .entry((episode.season_number, episode.episode_number))
            .and_modify(|existing| existing.has_synopsis |= episode.has_synopsis)
            .or_insert(episode);
    }

    pub fn contains(&self, season_number: u32, episode_number: u32) -> bool {
        self.episodes.contains_key(&(season_number, episode_number))
    }

    /// Whether any episode of the season is held locally.
    pub fn has_season(&self, season_number: u32) -> bool {
        self.episodes
            .range((season_number, 0)..=(season_number, u32::MAX))
            .next()
            .is_some()
    }

    /// Local episodes that have no synopsis yet.
    pub fn lacking_synopsis(&self) -> impl Iterator<Item = &LocalEpisode> {
        self.episodes.values().filter(|ep| !ep.has_synopsis)
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}

/// Metadata pushed back into the local library for a single episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeMetadataPatch {
    pub title: String,
    pub synopsis: String,
}
