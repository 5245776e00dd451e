//! The board runtime: owner of every timer, the global pause flag and the
//! last snapshot seen from the backend.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{AppSnapshot, Phase, Tick, Timer, TimerEntry, TimerState};
use crate::{
    clock::Clock,
    error::BoardError,
    render::{label_for, Renderer, Surface},
    tasks::ticker::{TickLoop, Ticker},
    theme::Theme,
};

/// Handle shared by the UI dispatcher, tick loops and the poller.
pub type SharedRuntime = Arc<Mutex<AppRuntime>>;

/// Lock the runtime, mapping poisoning to [`BoardError::Poisoned`].
pub fn lock_runtime(runtime: &SharedRuntime) -> Result<MutexGuard<'_, AppRuntime>, BoardError> {
    runtime.lock().map_err(|_| BoardError::Poisoned)
}

struct TimerSlot {
    timer: Timer,
    /// At most one loop per timer; dropping the handle stops the loop.
    tick_loop: Option<TickLoop>,
}

/// Local board state plus everything needed to display and save it.
pub struct AppRuntime {
    slots: Vec<TimerSlot>,
    is_paused: bool,
    pub(crate) last_state: Option<AppSnapshot>,
    clock: Arc<dyn Clock>,
    renderer: Renderer,
    save_tx: Option<mpsc::UnboundedSender<AppSnapshot>>,
    ticker: Ticker,
}

impl AppRuntime {
    /// Build the runtime with every timer in `Default` and paint the initial board.
    ///
    /// Snapshots queued for saving are sent on `save_tx`.
    pub fn shared(
        timers: Vec<Timer>,
        clock: Arc<dyn Clock>,
        surface: Box<dyn Surface>,
        save_tx: mpsc::UnboundedSender<AppSnapshot>,
        tick_interval: Duration,
    ) -> SharedRuntime {
        Arc::new_cyclic(|weak| {
            let mut runtime = Self {
                slots: timers
                    .into_iter()
                    .map(|timer| TimerSlot {
                        timer,
                        tick_loop: None,
                    })
                    .collect(),
                is_paused: false,
                last_state: None,
                clock,
                renderer: Renderer::new(surface),
                save_tx: Some(save_tx),
                ticker: Ticker::new(weak.clone(), tick_interval),
            };
            runtime.paint_all();
            Mutex::new(runtime)
        })
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn timer(&self, name: &str) -> Option<&Timer> {
        self.slots
            .iter()
            .map(|slot| &slot.timer)
            .find(|timer| timer.name() == name)
    }

    pub fn timers(&self) -> impl Iterator<Item = &Timer> {
        self.slots.iter().map(|slot| &slot.timer)
    }

    pub fn has_tick_loop(&self, name: &str) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.timer.name() == name && slot.tick_loop.is_some())
    }

    pub fn active_loops(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.tick_loop.is_some())
            .count()
    }

    /// The snapshot most recently applied from the backend.
    pub fn last_state(&self) -> Option<&AppSnapshot> {
        self.last_state.as_ref()
    }

    /// Handle a press on a timer button.
    ///
    /// `Default` starts the timer (pre-paused while the board is offline),
    /// `Ready` resets it, and presses on running or paused timers are ignored.
    pub fn press(&mut self, name: &str) -> Result<(), BoardError> {
        let idx = self.index_of(name)?;
        let now = self.clock.now_ms();

        match self.slots[idx].timer.state() {
            TimerState::Default if self.is_paused => {
                self.slots[idx].timer.start_offline()?;
                info!("Armed {} while offline", name);
            }
            TimerState::Default => {
                self.slots[idx].timer.start(now)?;
                self.start_loop(idx);
                info!("Started {}", name);
            }
            TimerState::Ready => {
                self.slots[idx].timer.reset()?;
                self.slots[idx].tick_loop = None;
                info!("Reset {}", name);
            }
            state @ (TimerState::Cooldown | TimerState::Paused) => {
                debug!("Ignoring press on {} while {}", name, state);
                return Ok(());
            }
        }

        self.paint(idx);
        self.request_save();
        Ok(())
    }

    /// Advance one timer's countdown. Called by its tick loop.
    pub fn tick(&mut self, name: &str) -> Tick {
        let Ok(idx) = self.index_of(name) else {
            return Tick::Idle;
        };
        let now = self.clock.now_ms();
        let tick = self.slots[idx].timer.tick(now);
        match tick {
            Tick::Running { .. } => self.paint(idx),
            Tick::Finished => {
                self.slots[idx].tick_loop = None;
                self.paint(idx);
                info!("{} is ready", name);
            }
            Tick::Idle => self.slots[idx].tick_loop = None,
        }
        tick
    }

    /// Freeze every running timer and mark the board paused. Saves once.
    pub fn pause_all(&mut self) {
        let now = self.clock.now_ms();
        self.is_paused = true;
        let mut paused = 0;
        for idx in 0..self.slots.len() {
            if self.slots[idx].timer.pause(now).is_ok() {
                self.slots[idx].tick_loop = None;
                self.paint(idx);
                paused += 1;
            }
        }
        info!("Paused {} running timers", paused);
        self.renderer.set_pause_control(true);
        self.request_save();
    }

    /// Restart every paused timer and clear the pause flag. Saves once.
    pub fn resume_all(&mut self) {
        let now = self.clock.now_ms();
        self.is_paused = false;
        let mut resumed = 0;
        for idx in 0..self.slots.len() {
            if let Ok(state) = self.slots[idx].timer.resume(now) {
                if state == TimerState::Cooldown {
                    self.start_loop(idx);
                }
                self.paint(idx);
                resumed += 1;
            }
        }
        info!("Resumed {} paused timers", resumed);
        self.renderer.set_pause_control(false);
        self.request_save();
    }

    pub fn toggle_pause(&mut self) {
        if self.is_paused {
            self.resume_all();
        } else {
            self.pause_all();
        }
    }

    /// Force every timer back to `Default` and clear the pause flag. Saves once.
    pub fn reset_all(&mut self) {
        for idx in 0..self.slots.len() {
            self.slots[idx].timer.force_reset();
            self.slots[idx].tick_loop = None;
            self.paint(idx);
        }
        self.is_paused = false;
        self.renderer.set_pause_control(false);
        info!("Reset all {} timers", self.slots.len());
        self.request_save();
    }

    pub fn apply_theme(&mut self, theme: Theme) {
        self.renderer.apply_theme(theme);
    }

    /// Serialize the live timers and pause flag.
    pub fn build_current_state(&self) -> AppSnapshot {
        AppSnapshot {
            is_paused: self.is_paused,
            timers: self
                .slots
                .iter()
                .map(|slot| (slot.timer.name().to_string(), entry_for(&slot.timer)))
                .collect(),
        }
    }

    /// The snapshot to send as the board goes away: running timers frozen
    /// at this instant and the board marked paused.
    pub fn exit_snapshot(&self) -> AppSnapshot {
        let mut snapshot = self.build_current_state();
        let frozen = snapshot.freeze(self.clock.now_ms());
        debug!("Exit snapshot froze {} running timers", frozen);
        snapshot
    }

    /// Queue the current state for pushing to the backend.
    pub fn request_save(&mut self) {
        let Some(save_tx) = &self.save_tx else {
            debug!("Save queue closed, not saving");
            return;
        };
        if let Err(e) = save_tx.send(self.build_current_state()) {
            warn!("Save queue closed, dropping snapshot: {}", e);
        }
    }

    /// Stop queueing saves. Once the save task has pushed what is already
    /// queued it sees the closed channel and exits.
    pub fn close_saves(&mut self) {
        if self.save_tx.take().is_some() {
            debug!("Save queue closed");
        }
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn set_paused_flag(&mut self, paused: bool) {
        self.is_paused = paused;
        self.renderer.set_pause_control(paused);
    }

    /// Replace one timer's phase, cancelling its loop first and restarting it
    /// only for a live (unpaused) countdown.
    pub(crate) fn restore_slot(&mut self, idx: usize, phase: Phase) {
        self.slots[idx].tick_loop = None;
        self.slots[idx].timer.restore(phase);
        if matches!(phase, Phase::Cooldown { .. }) && !self.is_paused {
            self.start_loop(idx);
        }
        self.paint(idx);
    }

    pub(crate) fn slot_name(&self, idx: usize) -> &str {
        self.slots[idx].timer.name()
    }

    fn index_of(&self, name: &str) -> Result<usize, BoardError> {
        self.slots
            .iter()
            .position(|slot| slot.timer.name() == name)
            .ok_or_else(|| BoardError::UnknownTimer(name.to_string()))
    }

    fn start_loop(&mut self, idx: usize) {
        let tick_loop = self.ticker.spawn(self.slots[idx].timer.name());
        self.slots[idx].tick_loop = Some(tick_loop);
    }

    fn paint(&mut self, idx: usize) {
        let now = self.clock.now_ms();
        let timer = &self.slots[idx].timer;
        let label = label_for(
            timer.name(),
            timer.state(),
            timer.remaining_ms(now).unwrap_or(0),
        );
        let enabled = timer.is_interactive();
        let name = timer.name().to_string();
        self.renderer.render(&name, &label);
        self.renderer.set_enabled(&name, enabled);
    }

    fn paint_all(&mut self) {
        for idx in 0..self.slots.len() {
            self.paint(idx);
        }
        self.renderer.set_pause_control(self.is_paused);
    }
}

fn entry_for(timer: &Timer) -> TimerEntry {
    match timer.phase() {
        Phase::Cooldown { end_time } => TimerEntry::cooldown(end_time),
        Phase::Paused { remaining_ms } => TimerEntry::paused(remaining_ms),
        Phase::Default => TimerEntry::with_state(TimerState::Default),
        Phase::Ready => TimerEntry::with_state(TimerState::Ready),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{clock::ManualClock, render::surface::RecordingSurface};

    pub(crate) const NOW: i64 = 1_700_000_000_000;

    pub(crate) struct Harness {
        pub runtime: SharedRuntime,
        pub clock: ManualClock,
        pub surface: RecordingSurface,
        pub saves: mpsc::UnboundedReceiver<AppSnapshot>,
    }

    impl Harness {
        pub fn new(timers: &[(&str, u64)]) -> Self {
            let clock = ManualClock::new(NOW);
            let surface = RecordingSurface::default();
            let (save_tx, saves) = mpsc::unbounded_channel();
            let runtime = AppRuntime::shared(
                timers
                    .iter()
                    .map(|(name, secs)| Timer::new(*name, *secs))
                    .collect(),
                Arc::new(clock.clone()),
                Box::new(surface.clone()),
                save_tx,
                Duration::from_millis(100),
            );
            Self {
                runtime,
                clock,
                surface,
                saves,
            }
        }

        pub fn board(&self) -> MutexGuard<'_, AppRuntime> {
            lock_runtime(&self.runtime).unwrap()
        }

        pub fn drain_saves(&mut self) -> Vec<AppSnapshot> {
            let mut saves = Vec::new();
            while let Ok(snapshot) = self.saves.try_recv() {
                saves.push(snapshot);
            }
            saves
        }
    }

    #[tokio::test]
    async fn initial_board_is_default_and_painted() {
        let mut h = Harness::new(&[("A", 10), ("B", 20)]);
        assert!(h.board().timers().all(|t| t.state() == TimerState::Default));
        assert_eq!(h.surface.last_label("A").unwrap().aria, "Start A timer");
        assert_eq!(*h.surface.controls.lock().unwrap(), vec!["Pause All"]);
        assert!(h.drain_saves().is_empty());
    }

    #[tokio::test]
    async fn press_starts_timer_with_full_duration_and_saves() {
        let mut h = Harness::new(&[("A", 30)]);
        h.board().press("A").unwrap();

        let board = h.board();
        let remaining = board.timer("A").unwrap().remaining_ms(board.now_ms()).unwrap();
        assert!(remaining > 30_000 - 5 && remaining <= 30_000);
        assert!(board.has_tick_loop("A"));
        drop(board);

        let saves = h.drain_saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].entry("A"), Some(&TimerEntry::cooldown(NOW + 30_000)));
        assert_eq!(h.surface.last_label("A").unwrap().text, "A\n00:30");
    }

    #[tokio::test]
    async fn press_on_running_timer_is_ignored() {
        let mut h = Harness::new(&[("A", 30)]);
        h.board().press("A").unwrap();
        h.drain_saves();

        h.clock.advance(1_000);
        h.board().press("A").unwrap();
        assert!(h.drain_saves().is_empty());
        assert_eq!(h.board().active_loops(), 1);
    }

    #[tokio::test]
    async fn unknown_timer_is_an_error() {
        let h = Harness::new(&[("A", 30)]);
        assert!(matches!(h.board().press("Z"), Err(BoardError::UnknownTimer(name)) if name == "Z"));
    }

    #[tokio::test]
    async fn tick_finishes_without_saving_and_press_resets() {
        let mut h = Harness::new(&[("A", 2)]);
        h.board().press("A").unwrap();
        h.drain_saves();

        h.clock.advance(1_500);
        assert_eq!(h.board().tick("A"), Tick::Running { remaining_ms: 500 });
        h.clock.advance(500);
        assert_eq!(h.board().tick("A"), Tick::Finished);
        assert!(!h.board().has_tick_loop("A"));
        assert!(h.drain_saves().is_empty());
        assert_eq!(h.surface.last_label("A").unwrap().text, "A\n00:00");
        assert_eq!(h.surface.last_label("A").unwrap().aria, "Reset A timer");

        h.board().press("A").unwrap();
        assert_eq!(h.board().timer("A").unwrap().state(), TimerState::Default);
        assert_eq!(h.drain_saves().len(), 1);
        assert_eq!(h.surface.last_label("A").unwrap().text, "A");
    }

    #[tokio::test]
    async fn ticks_within_the_same_second_do_not_repaint() {
        let h = Harness::new(&[("A", 10)]);
        h.board().press("A").unwrap();
        let before = h.surface.paint_count("A");

        for _ in 0..9 {
            h.clock.advance(100);
            h.board().tick("A");
        }
        assert_eq!(h.surface.paint_count("A"), before + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_loop_reaches_ready_within_one_interval_of_expiry() {
        let h = Harness::new(&[("A", 1)]);
        h.board().press("A").unwrap();

        h.clock.advance(999);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(h.board().timer("A").unwrap().state(), TimerState::Cooldown);

        h.clock.advance(1);
        tokio::time::sleep(Duration::from_millis(110)).await;
        let board = h.board();
        assert_eq!(board.timer("A").unwrap().state(), TimerState::Ready);
        assert_eq!(board.active_loops(), 0);
    }

    #[tokio::test]
    async fn pause_all_and_resume_all_save_once_each() {
        let mut h = Harness::new(&[("A", 60), ("B", 60), ("C", 60)]);
        h.board().press("A").unwrap();
        h.board().press("B").unwrap();
        h.drain_saves();

        h.clock.advance(10_000);
        h.board().pause_all();
        let saves = h.drain_saves();
        assert_eq!(saves.len(), 1);
        assert!(saves[0].is_paused);
        assert_eq!(saves[0].entry("A"), Some(&TimerEntry::paused(50_000)));
        assert_eq!(saves[0].entry("C"), Some(&TimerEntry::with_state(TimerState::Default)));
        assert_eq!(h.board().active_loops(), 0);

        h.clock.advance(600_000);
        h.board().toggle_pause();
        let saves = h.drain_saves();
        assert_eq!(saves.len(), 1);
        assert!(!saves[0].is_paused);
        let resumed_at = NOW + 610_000;
        assert_eq!(saves[0].entry("B"), Some(&TimerEntry::cooldown(resumed_at + 50_000)));
        assert_eq!(h.board().active_loops(), 2);
        assert_eq!(
            *h.surface.controls.lock().unwrap(),
            vec!["Pause All", "Resume All", "Pause All"]
        );
    }

    #[tokio::test]
    async fn press_while_offline_arms_paused_timer() {
        let mut h = Harness::new(&[("A", 45)]);
        h.board().pause_all();
        h.drain_saves();

        h.board().press("A").unwrap();
        let board = h.board();
        assert_eq!(
            board.timer("A").unwrap().phase(),
            Phase::Paused { remaining_ms: 45_000 }
        );
        assert_eq!(board.active_loops(), 0);
        drop(board);
        assert_eq!(h.drain_saves().len(), 1);
        assert_eq!(h.surface.last_label("A").unwrap().aria, "A 00:45 remaining");
    }

    #[tokio::test]
    async fn reset_all_saves_once_and_clears_pause() {
        let mut h = Harness::new(&[("A", 5), ("B", 5), ("C", 5), ("D", 5)]);
        for name in ["A", "B", "C"] {
            h.board().press(name).unwrap();
        }
        h.board().pause_all();
        h.drain_saves();

        h.board().reset_all();
        let saves = h.drain_saves();
        assert_eq!(saves.len(), 1);
        assert!(!saves[0].is_paused);
        assert!(saves[0]
            .timers
            .values()
            .all(|entry| entry.state == TimerState::Default));
        assert!(!h.board().is_paused());
        assert_eq!(h.board().active_loops(), 0);
    }

    #[tokio::test]
    async fn closed_save_queue_drops_later_saves() {
        let mut h = Harness::new(&[("A", 30)]);
        h.board().press("A").unwrap();
        h.board().close_saves();
        h.board().pause_all();

        assert_eq!(h.drain_saves().len(), 1);
        assert!(matches!(
            h.saves.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        assert_eq!(h.board().timer("A").unwrap().state(), TimerState::Paused);
    }

    #[tokio::test]
    async fn exit_snapshot_freezes_running_timers() {
        let h = Harness::new(&[("A", 60), ("B", 60)]);
        h.board().press("A").unwrap();
        h.clock.advance(48_000);

        let snapshot = h.board().exit_snapshot();
        assert!(snapshot.is_paused);
        assert_eq!(snapshot.entry("A"), Some(&TimerEntry::paused(12_000)));
        assert_eq!(snapshot.entry("B"), Some(&TimerEntry::with_state(TimerState::Default)));
        // The live board keeps running until it is actually torn down.
        assert_eq!(h.board().timer("A").unwrap().state(), TimerState::Cooldown);
    }
}
