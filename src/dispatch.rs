//! UI event dispatcher: turns button presses and global actions into board transitions

use tracing::{info, warn};

use crate::{
    error::BoardError,
    state::{lock_runtime, SharedRuntime},
    theme::ThemeStore,
};

/// Something the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Press a timer button.
    Press(String),
    /// The "Pause All" / "Resume All" control.
    TogglePause,
    ResetAll,
    ToggleTheme,
    Quit,
}

impl UiEvent {
    /// Parse one line of input. A line that is not a command presses the
    /// timer of that name; blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let event = match line {
            "pause" | "resume" => Self::TogglePause,
            "reset-all" => Self::ResetAll,
            "theme" => Self::ToggleTheme,
            "quit" | "exit" => Self::Quit,
            _ => match line.strip_prefix("press ") {
                Some(name) => Self::Press(name.trim().to_string()),
                None => Self::Press(line.to_string()),
            },
        };
        Some(event)
    }
}

/// Whether the event loop should keep going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Dispatcher {
    runtime: SharedRuntime,
    theme: ThemeStore,
}

impl Dispatcher {
    /// Create the dispatcher and show the saved theme.
    pub fn new(runtime: SharedRuntime, theme: ThemeStore) -> Result<Self, BoardError> {
        lock_runtime(&runtime)?.apply_theme(theme.current());
        Ok(Self { runtime, theme })
    }

    pub fn dispatch(&mut self, event: &UiEvent) -> Result<Flow, BoardError> {
        match event {
            UiEvent::Press(name) => lock_runtime(&self.runtime)?.press(name)?,
            UiEvent::TogglePause => lock_runtime(&self.runtime)?.toggle_pause(),
            UiEvent::ResetAll => lock_runtime(&self.runtime)?.reset_all(),
            UiEvent::ToggleTheme => {
                let theme = match self.theme.toggle() {
                    Ok(theme) => theme,
                    Err(e) => {
                        warn!("Failed to save theme preference: {}", e);
                        self.theme.current()
                    }
                };
                info!("Theme set to {}", theme);
                lock_runtime(&self.runtime)?.apply_theme(theme);
            }
            UiEvent::Quit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        state::{runtime::tests::Harness, TimerState},
        theme::Theme,
    };

    #[test]
    fn parses_commands_and_bare_names() {
        assert_eq!(UiEvent::parse("  "), None);
        assert_eq!(UiEvent::parse("pause"), Some(UiEvent::TogglePause));
        assert_eq!(UiEvent::parse("reset-all"), Some(UiEvent::ResetAll));
        assert_eq!(UiEvent::parse("theme"), Some(UiEvent::ToggleTheme));
        assert_eq!(UiEvent::parse("quit"), Some(UiEvent::Quit));
        assert_eq!(
            UiEvent::parse("press Payphone Hit"),
            Some(UiEvent::Press("Payphone Hit".into()))
        );
        assert_eq!(UiEvent::parse("Bunker\n"), Some(UiEvent::Press("Bunker".into())));
    }

    fn theme_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "cooldown-board-dispatch-{}-{}.json",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    #[tokio::test]
    async fn routes_events_to_the_board() {
        let mut h = Harness::new(&[("A", 10), ("B", 10)]);
        let path = theme_path();
        let mut dispatcher =
            Dispatcher::new(h.runtime.clone(), ThemeStore::load(&path)).unwrap();

        let press = UiEvent::Press("A".into());
        assert_eq!(dispatcher.dispatch(&press).unwrap(), Flow::Continue);
        assert_eq!(h.board().timer("A").unwrap().state(), TimerState::Cooldown);

        dispatcher.dispatch(&UiEvent::TogglePause).unwrap();
        assert_eq!(h.board().timer("A").unwrap().state(), TimerState::Paused);

        dispatcher.dispatch(&UiEvent::ResetAll).unwrap();
        assert_eq!(h.board().timer("A").unwrap().state(), TimerState::Default);
        assert_eq!(h.drain_saves().len(), 3);

        dispatcher.dispatch(&UiEvent::ToggleTheme).unwrap();
        assert_eq!(*h.surface.themes.lock().unwrap(), vec![Theme::Light, Theme::Dark]);
        assert_eq!(dispatcher.dispatch(&UiEvent::Quit).unwrap(), Flow::Exit);
        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn unknown_timer_is_reported() {
        let h = Harness::new(&[("A", 10)]);
        let mut dispatcher =
            Dispatcher::new(h.runtime.clone(), ThemeStore::load(theme_path())).unwrap();
        assert!(matches!(
            dispatcher.dispatch(&UiEvent::Press("nope".into())),
            Err(BoardError::UnknownTimer(_))
        ));
    }
}
