//! Shared error types

use thiserror::Error;

use crate::state::TimerState;

/// Errors raised by the local board runtime.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BoardError {
    #[error("no timer named {0:?}")]
    UnknownTimer(String),
    #[error("cannot {action} timer {name:?} while it is {from}")]
    InvalidTransition {
        name: String,
        from: TimerState,
        action: &'static str,
    },
    #[error("board runtime lock poisoned")]
    Poisoned,
}

/// Errors raised while talking to the persistence endpoint.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error("state endpoint answered with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors raised while reading or writing local JSON files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
