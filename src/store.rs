//! Layout store persisted as JSON in the user's home directory
//!
//! Every operation is a full load-mutate-save cycle; the process runs one
//! command per invocation, so nothing is cached between calls. Concurrent
//! invocations are last-write-wins.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;

use crate::constants::config;
use crate::types::DisplayInfo;

/// On-disk document: layout name → displays recorded at save time
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub layouts: HashMap<String, Vec<DisplayInfo>>,
}

/// Handle to the layout store file
pub struct LayoutStore {
    path: PathBuf,
}

impl LayoutStore {
    /// Store at the fixed per-user location (`~/.display-manager.json`)
    pub fn open_default() -> Self {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::FILENAME);
        Self { path }
    }

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the store, tolerating a missing or broken file.
    /// A file that exists but cannot be read or parsed logs a warning and
    /// yields an empty store; an absent file is not worth a warning.
    pub fn load(&self) -> Config {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Config::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read layout store, treating as empty");
                return Config::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed layout store, treating as empty");
                Config::default()
            }
        }
    }

    /// Overwrite the store on disk.
    /// Writes a sibling temp file and renames it over the target so a crash
    /// mid-write cannot leave a truncated store behind.
    pub fn save(&self, config: &Config) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(config).context("Failed to serialize layouts to JSON")?;
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, contents)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    /// Record `displays` under `name`, replacing any existing layout of that name
    pub fn set_layout(&self, name: &str, displays: Vec<DisplayInfo>) -> Result<()> {
        let mut config = self.load();
        config.layouts.insert(name.to_string(), displays);
        self.save(&config)
    }

    /// Remove the layout named `name`; returns whether it existed.
    /// Nothing is written when the name is unknown.
    pub fn remove_layout(&self, name: &str) -> Result<bool> {
        let mut config = self.load();
        if config.layouts.remove(name).is_none() {
            return Ok(false);
        }
        self.save(&config)?;
        Ok(true)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os: OsString = self.path.clone().into_os_string();
        os.push(config::TMP_SUFFIX);
        PathBuf::from(os)
    }
}
