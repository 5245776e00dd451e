//! Light/dark theme preference, persisted as a single key in a JSON file

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PersistError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "light",
            Self::Dark => "dark",
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default)]
    theme: Theme,
}

/// Theme preference backed by a local file.
#[derive(Debug)]
pub struct ThemeStore {
    path: PathBuf,
    current: Theme,
}

impl ThemeStore {
    /// Read the saved theme. A missing or unreadable file means `Light`.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match read_preferences(&path) {
            Ok(Some(prefs)) => prefs.theme,
            Ok(None) => {
                debug!("No preferences at {}, using light theme", path.display());
                Theme::default()
            }
            Err(e) => {
                warn!("Ignoring unreadable preferences {}: {}", path.display(), e);
                Theme::default()
            }
        };
        Self { path, current }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    /// Flip the theme and persist it. The in-memory theme flips even if the write fails.
    pub fn toggle(&mut self) -> Result<Theme, PersistError> {
        self.current = self.current.toggled();
        let body = serde_json::to_vec_pretty(&Preferences {
            theme: self.current,
        })?;
        std::fs::write(&self.path, body)?;
        Ok(self.current)
    }
}

fn read_preferences(path: &Path) -> Result<Option<Preferences>, PersistError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
