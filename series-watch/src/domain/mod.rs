//! Domain layer for series-watch.
//!
//! This module contains the tracked series entity and the value objects
//! exchanged with the remote catalog and the local library.

pub mod catalog;
pub mod library;
pub mod series;

pub use catalog::{
    EpisodeDescriptor, FinaleSignal, RemoteSeries, SPECIALS_SEASON, SeasonDescriptor,
    SeriesStatus, is_terminal_status,
};
pub use library::{EpisodeMetadataPatch, LocalEpisode, LocalInventory};
pub use series::{LifecycleState, TrackedSeries};
