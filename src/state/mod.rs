//! State management module
//!
//! This module contains the timer entity model, the transport snapshot and
//! the runtime that owns the local board.

pub mod runtime;
pub mod snapshot;
pub mod timer;

// Re-export main types
pub use runtime::{lock_runtime, AppRuntime, SharedRuntime};
pub use snapshot::{AppSnapshot, TimerEntry};
pub use timer::{Phase, Tick, Timer, TimerState};
