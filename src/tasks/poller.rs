//! Periodic pull of the shared state

use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    error::BoardError,
    state::{lock_runtime, SharedRuntime},
    sync::SyncClient,
};

/// Pull once and apply the result if it differs from the last applied snapshot.
///
/// Returns whether the board was reconciled. A failed pull leaves the board alone.
pub async fn poll_once(runtime: &SharedRuntime, client: &SyncClient) -> Result<bool, BoardError> {
    let snapshot = match client.pull().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Poll failed, keeping local state: {}", e);
            return Ok(false);
        }
    };
    let changed = lock_runtime(runtime)?.observe_remote(snapshot);
    Ok(changed)
}

/// Poll the backend every `period` until the runtime goes away.
pub async fn poll_task(runtime: SharedRuntime, client: SyncClient, period: Duration) {
    info!("Polling {} every {:?}", client.state_url(), period);

    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        interval.tick().await;
        match poll_once(&runtime, &client).await {
            Ok(true) => debug!("Remote state changed, board reconciled"),
            Ok(false) => {}
            Err(e) => {
                warn!("Stopping poller: {}", e);
                break;
            }
        }
    }
}
