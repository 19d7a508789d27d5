use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

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
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ThemePreference {
    theme: Theme,
}

/// Display preference stored as a small JSON file.
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Falls back to light when the file is absent or unreadable.
    pub fn load(&self) -> Theme {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "no saved theme");
                return Theme::default();
            }
        };

        match serde_json::from_str::<ThemePreference>(&raw) {
            Ok(preference) => preference.theme,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring invalid theme file");
                Theme::default()
            }
        }
    }

    pub fn save(&self, theme: Theme) -> anyhow::Result<()> {
        let body = serde_json::to_string(&ThemePreference { theme })?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("failed to write theme to {}", self.path.display()))?;
        Ok(())
    }

    pub fn toggle(&self) -> anyhow::Result<Theme> {
        let next = self.load().toggled();
        self.save(next)?;
        Ok(next)
    }
}
