//! Per-timer countdown loops

use std::{
    sync::{Mutex, Weak},
    time::Duration,
};
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error};

use crate::state::{AppRuntime, Tick};

/// Spawns tick loops that call back into the runtime that owns them.
pub struct Ticker {
    runtime: Weak<Mutex<AppRuntime>>,
    period: Duration,
}

/// Handle to a running tick loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct TickLoop {
    handle: JoinHandle<()>,
}

impl Drop for TickLoop {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl Ticker {
    pub fn new(runtime: Weak<Mutex<AppRuntime>>, period: Duration) -> Self {
        Self { runtime, period }
    }

    pub fn spawn(&self, name: &str) -> TickLoop {
        let handle = tokio::spawn(tick_loop(
            self.runtime.clone(),
            name.to_string(),
            self.period,
        ));
        TickLoop { handle }
    }
}

async fn tick_loop(runtime: Weak<Mutex<AppRuntime>>, name: String, period: Duration) {
    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately and the caller has already painted.
    interval.tick().await;

    loop {
        interval.tick().await;

        let Some(shared) = runtime.upgrade() else {
            break;
        };
        let tick = match shared.lock() {
            Ok(mut board) => board.tick(&name),
            Err(e) => {
                error!("Tick loop for {} cannot lock the board: {}", name, e);
                break;
            }
        };
        if !matches!(tick, Tick::Running { .. }) {
            debug!("Tick loop for {} stopped ({:?})", name, tick);
            break;
        }
    }
}
