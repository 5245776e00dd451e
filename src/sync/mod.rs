//! Remote sync: the HTTP client for the state endpoint and the logic that
//! folds a fetched snapshot back into the local board.

pub mod client;
pub mod reconcile;

pub use client::SyncClient;
pub use reconcile::{boot, phase_from_entry};
