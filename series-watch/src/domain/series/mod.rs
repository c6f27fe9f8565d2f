//! Tracked series domain module.

mod entity;
mod state;

pub use entity::TrackedSeries;
pub use state::LifecycleState;
