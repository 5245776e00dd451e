//! Applying a fetched snapshot to the local board
//!
//! Reconciliation supersedes local state entirely: every timer's tick loop is
//! cancelled, its phase is rebuilt from the snapshot entry (a missing entry
//! means `Default`) and a loop is restarted only for a live countdown on an
//! unpaused board. It never queues a save.

use tracing::{debug, info};

use crate::{
    error::BoardError,
    state::{lock_runtime, AppRuntime, AppSnapshot, Phase, SharedRuntime, TimerEntry, TimerState},
};

use super::SyncClient;

/// Work out a timer's phase from its snapshot entry at `now_ms`.
///
/// A countdown that ran out while nobody was watching comes back `Ready`,
/// even if the board was paused. A countdown recorded on a paused board is
/// frozen with the time it has left.
pub fn phase_from_entry(entry: Option<&TimerEntry>, board_paused: bool, now_ms: i64) -> Phase {
    let Some(entry) = entry else {
        return Phase::Default;
    };
    match entry.state {
        TimerState::Cooldown => match entry.end_time {
            Some(end_time) if end_time <= now_ms => Phase::Ready,
            Some(end_time) if board_paused => Phase::Paused {
                remaining_ms: end_time - now_ms,
            },
            Some(end_time) => Phase::Cooldown { end_time },
            None => Phase::Default,
        },
        TimerState::Paused => match entry.remaining {
            Some(remaining_ms) if remaining_ms > 0 => Phase::Paused { remaining_ms },
            Some(_) => Phase::Ready,
            None => Phase::Default,
        },
        TimerState::Ready => Phase::Ready,
        TimerState::Default => Phase::Default,
    }
}

impl AppRuntime {
    /// Make the board match `snapshot`. Idempotent; never saves.
    pub fn reconcile(&mut self, snapshot: &AppSnapshot) {
        let now = self.now_ms();
        self.set_paused_flag(snapshot.is_paused);
        for idx in 0..self.slot_count() {
            let phase = phase_from_entry(snapshot.entry(self.slot_name(idx)), snapshot.is_paused, now);
            self.restore_slot(idx, phase);
        }
        debug!(
            "Reconciled {} timers (paused={}, loops={})",
            self.slot_count(),
            snapshot.is_paused,
            self.active_loops()
        );
    }

    /// Reconcile with `snapshot` and remember it as the last applied state.
    pub fn apply_remote(&mut self, snapshot: AppSnapshot) {
        self.reconcile(&snapshot);
        self.last_state = Some(snapshot);
    }

    /// Apply a polled snapshot if it differs from the last one applied.
    /// Returns whether anything was applied.
    pub fn observe_remote(&mut self, snapshot: AppSnapshot) -> bool {
        if self.last_state.as_ref() == Some(&snapshot) {
            return false;
        }
        info!("Remote state changed, reconciling");
        self.apply_remote(snapshot);
        true
    }
}

/// Load the shared state into a fresh board and write the cleaned-up result back.
///
/// A failed load applies the empty snapshot, so every timer starts at `Default`.
pub async fn boot(runtime: &SharedRuntime, client: &SyncClient) -> Result<(), BoardError> {
    let snapshot = client.pull_or_default().await;
    let mut board = lock_runtime(runtime)?;
    board.apply_remote(snapshot);
    board.request_save();
    info!(
        "Board loaded: {} timers, paused={}",
        board.timers().count(),
        board.is_paused()
    );
    Ok(())
}
