//! Collaborator interfaces.
//!
//! The engine talks to three external systems: the local media library, the
//! remote catalog and the downstream acquisition service. Each is a trait so
//! concrete HTTP clients live outside this crate.
//!
//! Timeouts belong to the implementations; the engine adds none.

use async_trait::async_trait;

use crate::Result;
use crate::domain::{
    EpisodeDescriptor, EpisodeMetadataPatch, LocalInventory, SeasonDescriptor, SeriesStatus,
};

/// The local media library holding the user's files.
#[async_trait]
pub trait LocalLibrary: Send + Sync {
    /// Whether the library still knows the series.
    async fn exists(&self, local_id: &str) -> Result<bool>;

    /// Episodes currently held for the series.
    async fn inventory(&self, local_id: &str) -> Result<LocalInventory>;

    /// Push title and synopsis for one episode. Returns whether the library accepted it.
    async fn patch_episode_metadata(
        &self,
        local_id: &str,
        season_number: u32,
        episode_number: u32,
        patch: &EpisodeMetadataPatch,
    ) -> Result<bool>;
}

/// The authoritative remote catalog.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Series-level lifecycle status and finale airing fields.
    async fn series_status(&self, remote_id: &str) -> Result<SeriesStatus>;

    /// All seasons of the series, specials included.
    async fn season_list(&self, remote_id: &str) -> Result<Vec<SeasonDescriptor>>;

    /// Episodes of one season.
    async fn season_episodes(
        &self,
        remote_id: &str,
        season_number: u32,
    ) -> Result<Vec<EpisodeDescriptor>>;
}

/// Fire-and-forget "please acquire this" trigger.
///
/// Never called by the reconciler itself; see [`crate::watchlist::AcquisitionPass`].
#[async_trait]
pub trait AcquisitionTrigger: Send + Sync {
    /// Request the whole series (`season_number = None`) or a single season.
    async fn request_acquisition(&self, remote_id: &str, season_number: Option<u32>)
    -> Result<bool>;
}
