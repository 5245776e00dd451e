//! Cooldown Board - named cooldown timers kept in sync through a shared state endpoint
//!
//! The library holds the timer state machine, the label engine, the sync
//! client that reconciles the local board with the backend snapshot, and
//! the axum router that serves that snapshot.

pub mod api;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod render;
pub mod state;
pub mod store;
pub mod sync;
pub mod tasks;
pub mod theme;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::{AppRuntime, AppSnapshot, SharedRuntime};
pub use store::StateStore;
pub use sync::SyncClient;
pub use utils::signals::shutdown_signal;
