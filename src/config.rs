//! Per-project settings and window state, persisted as a TOML file.
//!
//! The store lives at `<config dir>/holdup/settings.toml` with one
//! `[projects."<key>"]` table per project and an ungrouped `[window]` table
//! for geometry. Reads never fail: a missing or unparseable file degrades to
//! defaults, because losing a saved preference is acceptable but failing the
//! dialog is not. Writes are staged through a sibling temp file, synced, and
//! renamed into place so a toggle saved just before a crash survives it.
//! Concurrent writers from two processes are last-writer-wins.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Application directory under the platform config root.
const APP_DIR: &str = "holdup";
/// Settings file name inside [`APP_DIR`].
const SETTINGS_FILE: &str = "settings.toml";

// ---------------------------------------------------------------------------
// Settings types
// ---------------------------------------------------------------------------

/// Per-project preferences, keyed by [`project_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Console command associated with the project; empty means unset.
    pub command: String,
    /// Run the command automatically when a session opens.
    pub auto_execute: bool,
    /// Require an explicit plan verdict before the agent proceeds.
    pub confirm_before_execute: bool,
    /// Whether the command console section is shown in the dialog.
    pub command_section_visible: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            auto_execute: false,
            confirm_before_execute: false,
            command_section_visible: true,
        }
    }
}

/// Process-wide dialog geometry, stored outside the project groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub maximized: bool,
}

/// On-disk shape of the settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    window: Option<WindowState>,
    #[serde(default)]
    projects: BTreeMap<String, ProjectConfig>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Filesystem-backed settings store.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Open the store at the platform default location.
    pub fn open_default() -> Result<Self, ConfigError> {
        let root = dirs::config_dir().ok_or_else(|| {
            ConfigError::Invalid("unable to resolve platform config directory".to_string())
        })?;
        Ok(Self {
            path: root.join(APP_DIR).join(SETTINGS_FILE),
        })
    }

    /// Open a store backed by an explicit file path.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings for a project key, falling back to defaults.
    pub fn load(&self, project_key: &str) -> ProjectConfig {
        self.read_file()
            .projects
            .get(project_key)
            .cloned()
            .unwrap_or_default()
    }

    /// Persist settings for a project key, durably, before returning.
    pub fn save(&self, project_key: &str, config: &ProjectConfig) -> Result<(), ConfigError> {
        let mut file = self.read_file();
        file.projects
            .insert(project_key.to_string(), config.clone());
        self.write_file(&file)
    }

    /// Load the saved window geometry, if any.
    pub fn load_window(&self) -> Option<WindowState> {
        self.read_file().window
    }

    /// Persist window geometry.
    pub fn save_window(&self, window: &WindowState) -> Result<(), ConfigError> {
        let mut file = self.read_file();
        file.window = Some(*window);
        self.write_file(&file)
    }

    fn read_file(&self) -> SettingsFile {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return SettingsFile::default(),
        };
        match toml::from_str(&raw) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(
                    "ignoring unparseable settings file {}: {e}",
                    self.path.display()
                );
                SettingsFile::default()
            }
        }
    }

    fn write_file(&self, file: &SettingsFile) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(file)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Stage into a sibling temp file so a partial write cannot corrupt
        // the last known-good settings; sync before the atomic rename so the
        // saved value survives an immediate crash.
        let tmp_path = self.path.with_extension("toml.tmp");
        {
            let mut tmp = fs::File::create(&tmp_path)?;
            tmp.write_all(text.as_bytes())?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Project keys
// ---------------------------------------------------------------------------

/// Canonical settings key for a project directory.
///
/// Uses the canonicalized absolute path so `./proj`, `proj/`, and symlinked
/// spellings of the same directory share one settings group. When
/// canonicalization fails the cleaned absolute path is used instead.
pub fn project_key(dir: &Path) -> String {
    if let Ok(canonical) = fs::canonicalize(dir) {
        return canonical.display().to_string();
    }
    if dir.is_absolute() {
        return dir.display().to_string();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(dir).display().to_string(),
        Err(_) => dir.display().to_string(),
    }
}
