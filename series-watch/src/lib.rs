//! series-watch library crate.
//!
//! Reconciles a local media library's view of in-progress TV series against a
//! remote catalog and keeps every tracked series Watching, Paused or Completed.

pub mod clients;
pub mod config;
pub mod database;
pub mod domain;
pub mod error;
pub mod logging;
pub mod watchlist;

pub use error::{Error, Result};
