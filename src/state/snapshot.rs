//! Transport snapshot exchanged with the state endpoint
//!
//! Peers have historically sent `endTime`/`remaining` as numbers, numeric
//! strings, empty strings or `null`. Everything is normalized to
//! `Option<i64>` on the way in; a value that does not parse is absent.
//! Timer entries that are not objects are dropped, which makes the timer
//! fall back to `default` when the snapshot is applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::TimerState;

/// The complete shared state: global pause flag plus one entry per timer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_paused: bool,
    #[serde(default, deserialize_with = "lenient_timers")]
    pub timers: BTreeMap<String, TimerEntry>,
}

/// Serialized form of a single timer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerEntry {
    #[serde(default, deserialize_with = "lenient_state")]
    pub state: TimerState,
    #[serde(
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub remaining: Option<i64>,
}

impl TimerEntry {
    pub fn cooldown(end_time: i64) -> Self {
        Self {
            state: TimerState::Cooldown,
            end_time: Some(end_time),
            remaining: None,
        }
    }

    pub fn paused(remaining: i64) -> Self {
        Self {
            state: TimerState::Paused,
            end_time: None,
            remaining: Some(remaining),
        }
    }

    pub fn with_state(state: TimerState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }
}

impl AppSnapshot {
    pub fn entry(&self, name: &str) -> Option<&TimerEntry> {
        self.timers.get(name)
    }

    /// Freeze every running entry at `now_ms` and raise the global pause flag.
    ///
    /// Each `cooldown` entry becomes `paused` with the time left at that
    /// instant (never negative). Returns how many entries were frozen.
    pub fn freeze(&mut self, now_ms: i64) -> usize {
        let mut frozen = 0;
        for entry in self.timers.values_mut() {
            if entry.state == TimerState::Cooldown {
                let remaining = entry.end_time.map_or(0, |end| (end - now_ms).max(0));
                *entry = TimerEntry::paused(remaining);
                frozen += 1;
            }
        }
        self.is_paused = true;
        frozen
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn lenient_state<'de, D>(deserializer: D) -> Result<TimerState, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(raw) => TimerState::parse_lenient(&raw),
        _ => TimerState::Default,
    })
}

fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(millis_from_value(&Value::deserialize(deserializer)?))
}

fn lenient_timers<'de, D>(deserializer: D) -> Result<BTreeMap<String, TimerEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(raw) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .is_object()
                .then(|| serde_json::from_value::<TimerEntry>(value).ok())
                .flatten()
                .map(|entry| (name, entry))
        })
        .collect())
}

fn millis_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(finite_to_millis)),
        Value::String(raw) => {
            let raw = raw.trim();
            raw.parse::<i64>()
                .ok()
                .or_else(|| raw.parse::<f64>().ok().and_then(finite_to_millis))
        }
        _ => None,
    }
}

fn finite_to_millis(value: f64) -> Option<i64> {
    value.is_finite().then_some(value.trunc() as i64)
}
