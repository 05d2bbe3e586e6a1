use std::{env, path::PathBuf};

use super::schema::Settings;

const MAX_SEEK_SECONDS: u64 = 3600;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `JUKEBOX__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("JUKEBOX")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.monitor.max_stalls == 0 {
            return Err("monitor.max_stalls must be >= 1".to_string());
        }
        if self.monitor.poll_interval_ms == 0 {
            return Err("monitor.poll_interval_ms must be >= 1".to_string());
        }
        if self.ui.tick_ms == 0 {
            return Err("ui.tick_ms must be >= 1".to_string());
        }
        if self.playback.seek_seconds == 0 || self.playback.seek_seconds > MAX_SEEK_SECONDS {
            return Err(format!(
                "playback.seek_seconds must be within 1..={MAX_SEEK_SECONDS}"
            ));
        }
        if self.playback.volume_step == 0 || self.playback.volume_step > 100 {
            return Err("playback.volume_step must be within 1..=100".to_string());
        }
        if self
            .library
            .extensions
            .iter()
            .all(|e| e.trim().trim_start_matches('.').is_empty())
        {
            return Err("library.extensions must name at least one extension".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `JUKEBOX_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("JUKEBOX_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    config_home().map(|d| d.join("jukebox").join("config.toml"))
}

/// `$XDG_CONFIG_HOME`, or `~/.config` when it is not set.
pub fn config_home() -> Option<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    }
}
