//! Drains the save queue into the state endpoint

use tokio::{sync::mpsc, task::JoinHandle, time::timeout};
use tracing::{debug, info, warn};

use crate::{
    error::BoardError,
    state::{lock_runtime, AppSnapshot, SharedRuntime},
    sync::SyncClient,
};

/// Push every queued snapshot in order. Failures are logged and dropped.
pub async fn push_task(client: SyncClient, mut saves: mpsc::UnboundedReceiver<AppSnapshot>) {
    info!("Starting save task for {}", client.state_url());

    while let Some(snapshot) = saves.recv().await {
        match client.push(&snapshot).await {
            Ok(()) => debug!("Saved state ({} timers)", snapshot.timers.len()),
            Err(e) => warn!("Failed to save state: {}", e),
        }
    }

    debug!("Save queue closed, save task exiting");
}

/// Send the paused exit snapshot after everything already queued.
///
/// The save queue is closed first and `pusher` is given the beacon timeout
/// to finish, so an earlier save cannot land after the exit state. A save
/// task that overruns is aborted before the beacon goes out.
pub async fn flush_on_exit(
    runtime: &SharedRuntime,
    client: &SyncClient,
    mut pusher: JoinHandle<()>,
) -> Result<(), BoardError> {
    let snapshot = {
        let mut board = lock_runtime(runtime)?;
        board.close_saves();
        board.exit_snapshot()
    };

    match timeout(client.beacon_timeout(), &mut pusher).await {
        Ok(Ok(())) => debug!("Save queue drained"),
        Ok(Err(e)) => warn!("Save task ended abnormally: {}", e),
        Err(_) => {
            warn!("Save queue did not drain in time, dropping pending saves");
            pusher.abort();
        }
    }

    if let Err(e) = client.beacon(snapshot).await {
        warn!("Exit flush task failed: {}", e);
    }
    Ok(())
}
