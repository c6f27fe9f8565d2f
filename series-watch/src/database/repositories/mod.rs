//! Repository layer for database access.

pub mod acquisition_quota;
pub mod tracked_series;

pub use acquisition_quota::*;
pub use tracked_series::*;
