//! Timer entity and its state machine

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// Wire-level name of a timer's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Default,
    Cooldown,
    Paused,
    Ready,
}

impl TimerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Cooldown => "cooldown",
            Self::Paused => "paused",
            Self::Ready => "ready",
        }
    }

    /// Parse a state name, treating anything unrecognised as `Default`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cooldown" => Self::Cooldown,
            "paused" => Self::Paused,
            "ready" => Self::Ready,
            _ => Self::Default,
        }
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timer's state together with the one time value that is authoritative in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Default,
    /// Counting down towards an absolute end time (ms since epoch).
    Cooldown { end_time: i64 },
    /// Frozen with a fixed amount of time left.
    Paused { remaining_ms: i64 },
    Ready,
}

impl Phase {
    pub fn state(&self) -> TimerState {
        match self {
            Self::Default => TimerState::Default,
            Self::Cooldown { .. } => TimerState::Cooldown,
            Self::Paused { .. } => TimerState::Paused,
            Self::Ready => TimerState::Ready,
        }
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running { remaining_ms: i64 },
    /// The countdown reached zero on this tick and the timer is now `Ready`.
    Finished,
    /// The timer was not counting down.
    Idle,
}

/// One named cooldown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    name: String,
    cooldown_secs: u64,
    phase: Phase,
}

impl Timer {
    pub fn new(name: impl Into<String>, cooldown_secs: u64) -> Self {
        Self {
            name: name.into(),
            cooldown_secs,
            phase: Phase::Default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cooldown_secs(&self) -> u64 {
        self.cooldown_secs
    }

    pub fn cooldown_ms(&self) -> i64 {
        i64::try_from(self.cooldown_secs)
            .unwrap_or(i64::MAX / 1000)
            .saturating_mul(1000)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> TimerState {
        self.phase.state()
    }

    /// Time left at `now_ms`, for the states that have one.
    pub fn remaining_ms(&self, now_ms: i64) -> Option<i64> {
        match self.phase {
            Phase::Cooldown { end_time } => Some(end_time - now_ms),
            Phase::Paused { remaining_ms } => Some(remaining_ms),
            Phase::Default | Phase::Ready => None,
        }
    }

    /// Whether the button accepts presses in the current state.
    pub fn is_interactive(&self) -> bool {
        matches!(self.phase, Phase::Default | Phase::Ready)
    }

    pub fn start(&mut self, now_ms: i64) -> Result<(), BoardError> {
        self.require(TimerState::Default, "start")?;
        self.phase = Phase::Cooldown {
            end_time: now_ms.saturating_add(self.cooldown_ms()),
        };
        Ok(())
    }

    /// Arm the timer without running it: it starts out paused with its full duration.
    pub fn start_offline(&mut self) -> Result<(), BoardError> {
        self.require(TimerState::Default, "start")?;
        self.phase = Phase::Paused {
            remaining_ms: self.cooldown_ms(),
        };
        Ok(())
    }

    pub fn tick(&mut self, now_ms: i64) -> Tick {
        let Phase::Cooldown { end_time } = self.phase else {
            return Tick::Idle;
        };
        let remaining_ms = end_time - now_ms;
        if remaining_ms <= 0 {
            self.finish().map_or(Tick::Idle, |()| Tick::Finished)
        } else {
            Tick::Running { remaining_ms }
        }
    }

    pub fn finish(&mut self) -> Result<(), BoardError> {
        self.require(TimerState::Cooldown, "finish")?;
        self.phase = Phase::Ready;
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), BoardError> {
        self.require(TimerState::Ready, "reset")?;
        self.phase = Phase::Default;
        Ok(())
    }

    pub fn force_reset(&mut self) {
        self.phase = Phase::Default;
    }

    pub fn pause(&mut self, now_ms: i64) -> Result<(), BoardError> {
        let Phase::Cooldown { end_time } = self.phase else {
            return Err(self.invalid("pause"));
        };
        self.phase = Phase::Paused {
            remaining_ms: (end_time - now_ms).max(0),
        };
        Ok(())
    }

    /// Resume a paused timer. A timer with no time left goes straight to `Ready`.
    pub fn resume(&mut self, now_ms: i64) -> Result<TimerState, BoardError> {
        let Phase::Paused { remaining_ms } = self.phase else {
            return Err(self.invalid("resume"));
        };
        self.phase = if remaining_ms > 0 {
            Phase::Cooldown {
                end_time: now_ms.saturating_add(remaining_ms),
            }
        } else {
            Phase::Ready
        };
        Ok(self.state())
    }

    /// Overwrite the phase wholesale. Used when applying a remote snapshot.
    pub(crate) fn restore(&mut self, phase: Phase) {
        self.phase = phase;
    }

    fn require(&self, expected: TimerState, action: &'static str) -> Result<(), BoardError> {
        if self.state() == expected {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> BoardError {
        BoardError::InvalidTransition {
            name: self.name.clone(),
            from: self.state(),
            action,
        }
    }
}
