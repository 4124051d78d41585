// SPDX-License-Identifier: MPL-2.0

use crate::config::{APP_ID, SETTINGS_KEY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Opt-in behaviour toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experiments {
    /// Blur videos so a stream does not show them unasked.
    pub streamer_mode: bool,
    /// Show raw payload dumps.
    pub dev_mode: bool,
    /// Hide follower/like/repost counts.
    pub zen_mode: bool,
    /// Number of timeline columns side by side.
    pub columns: u32,
    #[serde(rename = "responsiveUI")]
    pub responsive_ui: bool,
}

impl Default for Experiments {
    fn default() -> Self {
        Self {
            streamer_mode: true,
            dev_mode: false,
            zen_mode: false,
            columns: 1,
            responsive_ui: false,
        }
    }
}

/// Persistent user preferences
///
/// Fields missing from a stored document take their defaults, so older files
/// keep loading after new experiments are added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub experiments: Experiments,
    /// Feed URI per column; an empty or missing entry means the home timeline.
    pub columns: Vec<String>,
}

impl Settings {
    pub fn column_feed(&self, column: usize) -> Option<&str> {
        self.columns
            .get(column)
            .map(String::as_str)
            .filter(|uri| !uri.is_empty())
    }
}

/// Owns the settings for the process and writes every change through.
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    current: Settings,
}

impl SettingsStore {
    /// `~/.config/io.github.sethcottle.Skydeck/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push(APP_ID);
            p.push(format!("{SETTINGS_KEY}.json"));
            p
        })
    }

    /// Open the store at the default location.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::open(path),
            None => {
                warn!("no config directory, settings will not persist");
                Self::in_memory(Settings::default())
            }
        }
    }

    /// Open the store backed by `path`. A missing or unreadable document
    /// yields the defaults.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = Self::read(&path);
        Self {
            path: Some(path),
            current,
        }
    }

    /// A store that never touches the disk.
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            path: None,
            current: settings,
        }
    }

    fn read(path: &Path) -> Settings {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring corrupt settings");
                Settings::default()
            }),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no stored settings, using defaults");
                Settings::default()
            }
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.current
    }

    /// Replace the settings with an edited copy and persist it.
    ///
    /// The in-memory value changes even when writing fails.
    pub fn update(&mut self, edit: impl FnOnce(&mut Settings)) -> Result<(), SettingsError> {
        let mut next = self.current.clone();
        edit(&mut next);
        self.current = next;
        self.save()
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.current)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "settings saved");

        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
