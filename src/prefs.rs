//! User preferences persisted between runs as a small JSON document.
//!
//! ```json
//! {"volume": 50, "repeat_mode": 0, "last_directory": null, "found_music_dirs": []}
//! ```

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::audio::RepeatMode;
use crate::config::config_home;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub volume: i32,
    pub repeat_mode: RepeatMode,
    pub last_directory: Option<PathBuf>,
    pub found_music_dirs: Vec<PathBuf>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            volume: 50,
            repeat_mode: RepeatMode::Off,
            last_directory: None,
            found_music_dirs: Vec::new(),
        }
    }
}

/// Reads and writes [`Preferences`] at a fixed path.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `override_path`, `$JUKEBOX_PREFS_PATH`, or the default under
    /// the config home, in that order.
    pub fn resolve(override_path: Option<&Path>) -> Option<Self> {
        if let Some(p) = override_path {
            return Some(Self::new(p));
        }
        if let Some(p) = env::var_os("JUKEBOX_PREFS_PATH") {
            return Some(Self::new(PathBuf::from(p)));
        }
        config_home().map(|d| Self::new(d.join("jukebox").join("preferences.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means defaults. Volume is clamped to 0..=100.
    pub fn load(&self) -> Result<Preferences> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no preference file, using defaults");
                return Ok(Preferences::default());
            }
            Err(e) => return Err(self.error(e)),
        };

        let mut prefs: Preferences = serde_json::from_str(&text).map_err(|e| self.error(e))?;
        prefs.volume = prefs.volume.clamp(0, 100);
        Ok(prefs)
    }

    /// Like [`load`](Self::load), but a broken file is logged and replaced by defaults.
    pub fn load_or_default(&self) -> Preferences {
        self.load().unwrap_or_else(|e| {
            warn!(error = %e, "preferences unreadable, using defaults");
            Preferences::default()
        })
    }

    /// Write through a sibling temp file and rename it into place.
    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| self.error(e))?;
        }

        let json = serde_json::to_vec_pretty(prefs).map_err(|e| self.error(e))?;
        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(|e| self.error(e))?;
        file.write_all(&json).map_err(|e| self.error(e))?;
        file.sync_all().map_err(|e| self.error(e))?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(|e| self.error(e))?;

        debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }

    fn error(&self, reason: impl ToString) -> Error {
        Error::Config {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}
