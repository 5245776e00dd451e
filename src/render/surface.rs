//! Render targets and the write-suppressing renderer

use std::{collections::HashMap, io::Write};

use tracing::warn;

use super::Label;
use crate::theme::Theme;

/// Something that can display timer buttons. Implementations hold no timer state.
pub trait Surface: Send {
    fn paint(&mut self, name: &str, label: &Label);

    fn set_enabled(&mut self, _name: &str, _enabled: bool) {}

    fn set_pause_control(&mut self, _label: &str) {}

    fn set_theme(&mut self, _theme: Theme) {}
}

/// Caches what each button currently shows and only forwards changes.
pub struct Renderer {
    surface: Box<dyn Surface>,
    last_displayed: HashMap<String, Label>,
    enabled: HashMap<String, bool>,
    pause_control: Option<&'static str>,
}

impl Renderer {
    pub fn new(surface: Box<dyn Surface>) -> Self {
        Self {
            surface,
            last_displayed: HashMap::new(),
            enabled: HashMap::new(),
            pause_control: None,
        }
    }

    /// Paint `label` unless both its text and its aria label are already
    /// displayed. Returns whether a write happened.
    pub fn render(&mut self, name: &str, label: &Label) -> bool {
        if self.last_displayed.get(name) == Some(label) {
            return false;
        }
        self.surface.paint(name, label);
        self.last_displayed.insert(name.to_string(), label.clone());
        true
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) {
        if self.enabled.insert(name.to_string(), enabled) != Some(enabled) {
            self.surface.set_enabled(name, enabled);
        }
    }

    pub fn set_pause_control(&mut self, paused: bool) {
        let label = if paused { "Resume All" } else { "Pause All" };
        if self.pause_control != Some(label) {
            self.pause_control = Some(label);
            self.surface.set_pause_control(label);
        }
    }

    pub fn apply_theme(&mut self, theme: Theme) {
        self.surface.set_theme(theme);
    }

    pub fn cached_text(&self, name: &str) -> Option<&str> {
        self.last_displayed.get(name).map(|label| label.text.as_str())
    }
}

/// Line-oriented surface for terminals.
pub struct TerminalSurface<W> {
    out: W,
}

impl TerminalSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn line(&mut self, line: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            warn!("Failed to write to terminal: {}", e);
        }
    }
}

impl<W: Write + Send> Surface for TerminalSurface<W> {
    fn paint(&mut self, name: &str, label: &Label) {
        let shown = label.text.replace('\n', "  ");
        self.line(format_args!("[{name}] {shown}  ({})", label.aria));
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) {
        let status = if enabled { "enabled" } else { "disabled" };
        self.line(format_args!("[{name}] button {status}"));
    }

    fn set_pause_control(&mut self, label: &str) {
        self.line(format_args!("[controls] {label}"));
    }

    fn set_theme(&mut self, theme: Theme) {
        self.line(format_args!("[theme] {theme}"));
    }
}

/// Surface that records every call, for tests.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct RecordingSurface {
    pub(crate) paints: std::sync::Arc<std::sync::Mutex<Vec<(String, Label)>>>,
    pub(crate) enabled: std::sync::Arc<std::sync::Mutex<Vec<(String, bool)>>>,
    pub(crate) controls: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    pub(crate) themes: std::sync::Arc<std::sync::Mutex<Vec<Theme>>>,
}

#[cfg(test)]
impl RecordingSurface {
    pub(crate) fn paint_count(&self, name: &str) -> usize {
        self.paints
            .lock()
            .unwrap()
            .iter()
            .filter(|(painted, _)| painted == name)
            .count()
    }

    pub(crate) fn last_label(&self, name: &str) -> Option<Label> {
        self.paints
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(painted, _)| painted == name)
            .map(|(_, label)| label.clone())
    }
}

#[cfg(test)]
impl Surface for RecordingSurface {
    fn paint(&mut self, name: &str, label: &Label) {
        self.paints.lock().unwrap().push((name.to_string(), label.clone()));
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) {
        self.enabled.lock().unwrap().push((name.to_string(), enabled));
    }

    fn set_pause_control(&mut self, label: &str) {
        self.controls.lock().unwrap().push(label.to_string());
    }

    fn set_theme(&mut self, theme: Theme) {
        self.themes.lock().unwrap().push(theme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::label_for;
    use crate::state::TimerState;

    #[test]
    fn unchanged_label_is_written_once() {
        let surface = RecordingSurface::default();
        let mut renderer = Renderer::new(Box::new(surface.clone()));
        let label = label_for("Bunker", TimerState::Cooldown, 10_400);

        assert!(renderer.render("Bunker", &label));
        assert!(!renderer.render("Bunker", &label));
        assert_eq!(surface.paint_count("Bunker"), 1);

        // Same second, different millisecond: still the same text.
        assert!(!renderer.render("Bunker", &label_for("Bunker", TimerState::Cooldown, 10_001)));
        assert!(renderer.render("Bunker", &label_for("Bunker", TimerState::Cooldown, 9_999)));
        assert_eq!(surface.paint_count("Bunker"), 2);
        assert_eq!(renderer.cached_text("Bunker"), Some("Bunker\n00:09"));
    }

    #[test]
    fn aria_change_with_same_text_is_repainted() {
        let surface = RecordingSurface::default();
        let mut renderer = Renderer::new(Box::new(surface.clone()));

        assert!(renderer.render("Bunker", &label_for("Bunker", TimerState::Cooldown, 400)));
        assert!(renderer.render("Bunker", &label_for("Bunker", TimerState::Ready, 0)));
        assert_eq!(surface.paint_count("Bunker"), 2);
        assert_eq!(surface.last_label("Bunker").unwrap().aria, "Reset Bunker timer");
        assert_eq!(renderer.cached_text("Bunker"), Some("Bunker\n00:00"));
    }

    #[test]
    fn enabled_and_pause_control_only_forward_changes() {
        let surface = RecordingSurface::default();
        let mut renderer = Renderer::new(Box::new(surface.clone()));

        renderer.set_enabled("A", true);
        renderer.set_enabled("A", true);
        renderer.set_enabled("A", false);
        renderer.set_pause_control(false);
        renderer.set_pause_control(false);
        renderer.set_pause_control(true);

        assert_eq!(
            *surface.enabled.lock().unwrap(),
            vec![("A".to_string(), true), ("A".to_string(), false)]
        );
        assert_eq!(*surface.controls.lock().unwrap(), vec!["Pause All", "Resume All"]);
    }

    #[test]
    fn terminal_surface_writes_one_line_per_paint() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.paint("Bunker", &label_for("Bunker", TimerState::Ready, 0));
        surface.set_pause_control("Pause All");

        let output = String::from_utf8(surface.out).unwrap();
        assert_eq!(
            output,
            "[Bunker] Bunker  00:00  (Reset Bunker timer)\n[controls] Pause All\n"
        );
    }
}
