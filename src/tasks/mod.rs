//! Background tasks module
//!
//! This module contains the tasks that run alongside the board: per-timer
//! tick loops, the backend poller and the save queue drain.

pub mod poller;
pub mod pusher;
pub mod ticker;

// Re-export main functions
pub use poller::{poll_once, poll_task};
pub use pusher::{flush_on_exit, push_task};
pub use ticker::{TickLoop, Ticker};
