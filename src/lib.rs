//! offgrid - Offline-caching agent
//!
//! Precaches a web application's core assets, purges stale cache
//! versions on activation and answers intercepted requests from cache
//! or network depending on route and connectivity.

pub mod agent;
pub mod cache;
pub mod cli;
pub mod clients;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod journal;
pub mod network;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{OffgridError, OffgridResult};
