//! Database models for series-watch.
//!
//! These models map directly to the database schema. JSON columns are kept
//! as raw text here and decoded by the domain layer.

pub mod acquisition_quota;
pub mod tracked_series;

pub use acquisition_quota::*;
pub use tracked_series::*;
