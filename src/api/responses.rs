//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response to an accepted state write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub timers: usize,
}

impl SaveResponse {
    pub fn saved(timers: usize) -> Self {
        Self {
            status: "saved".to_string(),
            timestamp: Utc::now(),
            timers,
        }
    }
}

/// Summary of the stored state and the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub is_paused: bool,
    pub timer_count: usize,
    pub running: usize,
    pub uptime: String,
    pub last_write: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
