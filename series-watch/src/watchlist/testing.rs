//! In-memory collaborators shared by the watchlist unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::clients::{AcquisitionTrigger, LocalLibrary, RemoteCatalog};
use crate::database::repositories::{AcquisitionQuotaRepository, TrackedSeriesRepository};
use crate::domain::{
    EpisodeDescriptor, EpisodeMetadataPatch, LifecycleState, LocalEpisode, LocalInventory,
    RemoteSeries, SeasonDescriptor, SeriesStatus, TrackedSeries,
};
use crate::{Error, Result};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Mock tracked series repository.
#[derive(Default)]
pub struct MockRepository {
    pub series: Mutex<BTreeMap<String, TrackedSeries>>,
    pub fail_writes: Mutex<bool>,
    pub writes: Mutex<usize>,
}

impl MockRepository {
    pub fn with_series(series: Vec<TrackedSeries>) -> Self {
        let repo = Self::default();
        {
            let mut map = repo.series.lock().unwrap();
            for s in series {
                map.insert(s.local_id.clone(), s);
            }
        }
        repo
    }

    pub fn get(&self, local_id: &str) -> Option<TrackedSeries> {
        self.series.lock().unwrap().get(local_id).cloned()
    }

    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }

    fn check_writable(&self) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(Error::Other("disk full".to_string()));
        }
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }
}

#[async_trait]
impl TrackedSeriesRepository for MockRepository {
    async fn get_series(&self, local_id: &str) -> Result<Option<TrackedSeries>> {
        Ok(self.get(local_id))
    }

    async fn list_series_by_state(&self, state: LifecycleState) -> Result<Vec<TrackedSeries>> {
        Ok(self
            .series
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.lifecycle_state == state)
            .cloned()
            .collect())
    }

    async fn list_all_series(&self) -> Result<Vec<TrackedSeries>> {
        Ok(self.series.lock().unwrap().values().cloned().collect())
    }

    async fn upsert_series(&self, series: &TrackedSeries) -> Result<()> {
        self.check_writable()?;
        let mut map = self.series.lock().unwrap();
        let mut record = series.clone();
        if let Some(existing) = map.get(&series.local_id) {
            record.added_at = existing.added_at;
        }
        map.insert(record.local_id.clone(), record);
        Ok(())
    }

    async fn update_reconciliation(
        &self,
        series: &TrackedSeries,
    ) -> Result<Option<TrackedSeries>> {
        self.check_writable()?;
        let mut map = self.series.lock().unwrap();
        let Some(stored) = map.get_mut(&series.local_id) else {
            return Ok(None);
        };
        if stored.force_completed {
            stored.set_state(LifecycleState::Completed, None);
        } else {
            stored.set_state(series.lifecycle_state, series.paused_until);
        }
        stored.remote_status = series.remote_status.clone();
        stored.next_episode = series.next_episode.clone();
        stored.missing_seasons = series.missing_seasons.clone();
        stored.missing_episodes = series.missing_episodes.clone();
        stored.last_checked_at = series.last_checked_at;
        Ok(Some(stored.clone()))
    }

    async fn update_missing_seasons(
        &self,
        local_id: &str,
        seasons: &[SeasonDescriptor],
    ) -> Result<bool> {
        self.check_writable()?;
        let mut map = self.series.lock().unwrap();
        let Some(stored) = map.get_mut(local_id) else {
            return Ok(false);
        };
        stored.missing_seasons = seasons.to_vec();
        Ok(true)
    }

    async fn insert_series_if_absent(&self, series: &TrackedSeries) -> Result<bool> {
        self.check_writable()?;
        let mut map = self.series.lock().unwrap();
        if map.contains_key(&series.local_id) {
            return Ok(false);
        }
        map.insert(series.local_id.clone(), series.clone());
        Ok(true)
    }

    async fn delete_series(&self, local_id: &str) -> Result<bool> {
        self.check_writable()?;
        Ok(self.series.lock().unwrap().remove(local_id).is_some())
    }
}

/// Mock daily acquisition quota: `(date, cap, remaining)`.
#[derive(Default)]
pub struct MockQuota {
    pub state: Mutex<Option<(NaiveDate, usize, usize)>>,
}

#[async_trait]
impl AcquisitionQuotaRepository for MockQuota {
    async fn remaining_quota(&self, today: NaiveDate, daily_cap: usize) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let next = match *state {
            Some((date, cap, remaining)) if date == today => {
                let spent = cap.saturating_sub(remaining);
                (today, daily_cap, daily_cap.saturating_sub(spent))
            }
            _ => (today, daily_cap, daily_cap),
        };
        *state = Some(next);
        Ok(next.2)
    }

    async fn consume_quota(&self, today: NaiveDate) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.as_mut() {
            Some((date, _, remaining)) if *date == today && *remaining > 0 => {
                *remaining -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Mock local library. A series exists while it has an inventory entry.
#[derive(Default)]
pub struct MockLibrary {
    pub inventories: Mutex<HashMap<String, LocalInventory>>,
    pub fail: Mutex<bool>,
    pub reject_patches: Mutex<bool>,
    pub patches: Mutex<Vec<(String, u32, u32, EpisodeMetadataPatch)>>,
}

impl MockLibrary {
    pub fn holding(&self, local_id: &str, episodes: &[(u32, u32)]) {
        let inventory = LocalInventory::from_episodes(
            episodes.iter().map(|&(s, e)| LocalEpisode::new(s, e, true)),
        );
        self.inventories
            .lock()
            .unwrap()
            .insert(local_id.to_string(), inventory);
    }

    pub fn holding_inventory(&self, local_id: &str, inventory: LocalInventory) {
        self.inventories
            .lock()
            .unwrap()
            .insert(local_id.to_string(), inventory);
    }

    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn patch_count(&self) -> usize {
        self.patches.lock().unwrap().len()
    }

    fn check(&self) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(Error::local("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl LocalLibrary for MockLibrary {
    async fn exists(&self, local_id: &str) -> Result<bool> {
        self.check()?;
        Ok(self.inventories.lock().unwrap().contains_key(local_id))
    }

    async fn inventory(&self, local_id: &str) -> Result<LocalInventory> {
        self.check()?;
        self.inventories
            .lock()
            .unwrap()
            .get(local_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Series", local_id))
    }

    async fn patch_episode_metadata(
        &self,
        local_id: &str,
        season_number: u32,
        episode_number: u32,
        patch: &EpisodeMetadataPatch,
    ) -> Result<bool> {
        if *self.reject_patches.lock().unwrap() {
            return Err(Error::local("patch rejected"));
        }
        self.patches.lock().unwrap().push((
            local_id.to_string(),
            season_number,
            episode_number,
            patch.clone(),
        ));
        Ok(true)
    }
}

/// Mock remote catalog keyed by remote id.
#[derive(Default)]
pub struct MockCatalog {
    pub series: Mutex<HashMap<String, RemoteSeries>>,
    pub fail: Mutex<bool>,
    pub status_calls: Mutex<usize>,
}

impl MockCatalog {
    pub fn insert(&self, remote_id: &str, series: RemoteSeries) {
        self.series
            .lock()
            .unwrap()
            .insert(remote_id.to_string(), series);
    }

    pub fn set_status(&self, remote_id: &str, status: SeriesStatus) {
        let mut map = self.series.lock().unwrap();
        let entry = map
            .entry(remote_id.to_string())
            .or_insert_with(|| RemoteSeries {
                status: status.clone(),
                seasons: Vec::new(),
                episodes: Vec::new(),
            });
        entry.status = status;
    }

    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }

    fn lookup(&self, remote_id: &str) -> Result<RemoteSeries> {
        if *self.fail.lock().unwrap() {
            return Err(Error::remote("503 Service Unavailable"));
        }
        self.series
            .lock()
            .unwrap()
            .get(remote_id)
            .cloned()
            .ok_or_else(|| Error::remote(format!("unknown series {}", remote_id)))
    }
}

#[async_trait]
impl RemoteCatalog for MockCatalog {
    async fn series_status(&self, remote_id: &str) -> Result<SeriesStatus> {
        *self.status_calls.lock().unwrap() += 1;
        Ok(self.lookup(remote_id)?.status)
    }

    async fn season_list(&self, remote_id: &str) -> Result<Vec<SeasonDescriptor>> {
        Ok(self.lookup(remote_id)?.seasons)
    }

    async fn season_episodes(
        &self,
        remote_id: &str,
        season_number: u32,
    ) -> Result<Vec<EpisodeDescriptor>> {
        Ok(self
            .lookup(remote_id)?
            .episodes
            .into_iter()
            .filter(|ep| ep.season_number == season_number)
            .collect())
    }
}

/// Mock acquisition trigger recording every request.
#[derive(Default)]
pub struct MockTrigger {
    pub requests: Mutex<Vec<(String, Option<u32>)>>,
    pub refuse_seasons: Mutex<Vec<u32>>,
}

#[async_trait]
impl AcquisitionTrigger for MockTrigger {
    async fn request_acquisition(
        &self,
        remote_id: &str,
        season_number: Option<u32>,
    ) -> Result<bool> {
        let refused = season_number
            .is_some_and(|season| self.refuse_seasons.lock().unwrap().contains(&season));
        if refused {
            return Err(Error::Acquisition("indexer offline".to_string()));
        }
        self.requests
            .lock()
            .unwrap()
            .push((remote_id.to_string(), season_number));
        Ok(true)
    }
}

/// Remote series with `seasons` full seasons of `per_season` episodes, all with synopses.
pub fn remote_series(status: &str, seasons: u32, per_season: u32) -> RemoteSeries {
    let mut episodes = Vec::new();
    let mut descriptors = Vec::new();
    for s in 1..=seasons {
        descriptors.push(SeasonDescriptor::new(s, per_season).with_air_date(date(2020, s, 1)));
        for e in 1..=per_season {
            episodes.push(
                EpisodeDescriptor::new(s, e, format!("S{s}E{e}"))
                    .with_air_date(date(2020, s, e))
                    .with_synopsis(format!("Episode {e} of season {s}")),
            );
        }
    }
    RemoteSeries {
        status: SeriesStatus::new(status),
        seasons: descriptors,
        episodes,
    }
}

/// Every `(season, episode)` pair of a full run.
pub fn full_run(seasons: u32, per_season: u32) -> Vec<(u32, u32)> {
    (1..=seasons)
        .flat_map(|s| (1..=per_season).map(move |e| (s, e)))
        .collect()
}
