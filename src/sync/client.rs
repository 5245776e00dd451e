//! HTTP client for `GET/POST /api/state`

use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{error::SyncError, state::AppSnapshot};

/// Path of the shared state on the backend.
pub const STATE_PATH: &str = "/api/state";

#[derive(Clone, Debug)]
pub struct SyncClient {
    client: Client,
    state_url: String,
    beacon_timeout: Duration,
}

impl SyncClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            state_url: format!("{}{}", base_url.trim_end_matches('/'), STATE_PATH),
            beacon_timeout: Duration::from_millis(500),
        }
    }

    /// Upper bound on how long an exit-time send may take.
    pub fn with_beacon_timeout(mut self, timeout: Duration) -> Self {
        self.beacon_timeout = timeout;
        self
    }

    pub fn beacon_timeout(&self) -> Duration {
        self.beacon_timeout
    }

    pub fn state_url(&self) -> &str {
        &self.state_url
    }

    /// Fetch the shared snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` when the request fails, the status is not 2xx,
    /// or the body is not a snapshot.
    pub async fn pull(&self) -> Result<AppSnapshot, SyncError> {
        let response = self.client.get(&self.state_url).send().await?;
        if !response.status().is_success() {
            return Err(SyncError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    /// Fetch the shared snapshot, falling back to the empty snapshot on any failure.
    pub async fn pull_or_default(&self) -> AppSnapshot {
        match self.pull().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Failed to load state, starting from empty: {}", e);
                AppSnapshot::default()
            }
        }
    }

    /// Replace the shared snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` when the request fails or the status is not 2xx.
    pub async fn push(&self, snapshot: &AppSnapshot) -> Result<(), SyncError> {
        let response = self
            .client
            .post(&self.state_url)
            .json(snapshot)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SyncError::HttpStatus(response.status()));
        }
        Ok(())
    }

    /// Send a snapshot without waiting for a response body.
    ///
    /// The request is spawned immediately and bounded by the beacon timeout;
    /// the returned handle only needs awaiting if the caller wants to give
    /// the send a chance to leave before the process exits.
    pub fn beacon(&self, snapshot: AppSnapshot) -> JoinHandle<()> {
        let request = self
            .client
            .post(&self.state_url)
            .timeout(self.beacon_timeout)
            .json(&snapshot);
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) => debug!("Beacon delivered ({})", response.status()),
                Err(e) => warn!("Beacon failed: {}", e),
            }
        })
    }
}
