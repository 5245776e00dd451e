//! Display text and accessibility labels

use crate::state::TimerState;

/// What a timer button shows and how it is announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    pub aria: String,
}

/// Format a duration as `MM:SS`, or `H:MM:SS` once it reaches an hour.
///
/// The duration is floored to whole seconds; negative values render as `00:00`.
pub fn format_remaining(remaining_ms: i64) -> String {
    let total_seconds = remaining_ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Compute the label for a timer. `remaining_ms` is ignored in `Default` and `Ready`.
pub fn label_for(name: &str, state: TimerState, remaining_ms: i64) -> Label {
    match state {
        TimerState::Default => Label {
            text: name.to_string(),
            aria: format!("Start {name} timer"),
        },
        TimerState::Ready => Label {
            text: format!("{name}\n00:00"),
            aria: format!("Reset {name} timer"),
        },
        TimerState::Cooldown | TimerState::Paused => {
            let time = format_remaining(remaining_ms);
            Label {
                text: format!("{name}\n{time}"),
                aria: format!("{name} {time} remaining"),
            }
        }
    }
}
