use std::path::PathBuf;

use serde::Deserialize;

use crate::library::SUPPORTED_EXTENSIONS;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/jukebox/config.toml` or `~/.config/jukebox/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `JUKEBOX__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
///
/// These are application settings; the user's volume, repeat mode and
/// discovery cache live in the separate preference file (see `prefs`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
    pub monitor: MonitorSettings,
    pub engine: EngineSettings,
    pub library: LibrarySettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
    pub mpris: MprisSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Seconds skipped by the seek keys.
    pub seek_seconds: u64,
    /// Volume change per key press (percentage points).
    pub volume_step: u8,
    /// Wait before each of the two "is it playing yet?" checks after starting a track.
    pub play_settle_ms: u64,
    /// Wait before verifying the position after a seek.
    pub seek_settle_ms: u64,
    /// Wait before re-reading an invalid engine position.
    pub time_retry_ms: u64,
    /// How long error messages stay on screen.
    pub error_ttl_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            seek_seconds: 10,
            volume_step: 10,
            play_settle_ms: 500,
            seek_settle_ms: 100,
            time_retry_ms: 100,
            error_ttl_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Delay between two monitor ticks when nothing happened.
    pub poll_interval_ms: u64,
    /// Delay after an end-of-track was handled.
    pub after_event_ms: u64,
    /// Delay after a tick failed.
    pub error_backoff_ms: u64,
    /// Events closer together than this count towards a stall.
    pub stall_window_secs: u64,
    /// Consecutive events that trigger a forced recovery.
    pub max_stalls: u32,
    /// Pause between the forced stop and the restart.
    pub recovery_pause_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            after_event_ms: 1000,
            error_backoff_ms: 1000,
            stall_window_secs: 5,
            max_stalls: 3,
            recovery_pause_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Read-ahead for local files (milliseconds of audio).
    pub file_caching_ms: u32,
    /// Read-ahead for network streams (milliseconds of audio).
    pub network_caching_ms: u32,
    /// Allow the engine to time-stretch audio/video.
    pub time_stretch: bool,
    /// Allow the engine to resample audio.
    pub resample: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            file_caching_ms: 1000,
            network_caching_ms: 1000,
            time_stretch: false,
            resample: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks while discovering music directories.
    pub follow_links: bool,
    /// Where discovery starts. Empty means the platform defaults.
    pub discovery_roots: Vec<PathBuf>,
    /// Override for the preference file location.
    pub prefs_path: Option<PathBuf>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            follow_links: false,
            discovery_roots: Vec::new(),
            prefs_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Foreground loop period: input poll timeout and redraw cadence.
    pub tick_ms: u64,
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Minimum delay between two mouse-wheel steps.
    pub mouse_cooldown_ms: u64,
    /// Seek presses closer together than this are one held key. Longer than
    /// the usual key-repeat delay.
    pub seek_repeat_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            tick_ms: 20,
            header_text: " ~ jukebox ~ ".to_string(),
            mouse_cooldown_ms: 100,
            seek_repeat_ms: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Directory for the rolling log file. Defaults to the XDG state dir.
    pub dir: Option<PathBuf>,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: None,
            filter: "info,jukebox=debug".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MprisSettings {
    /// Register an MPRIS service on the session bus.
    pub enabled: bool,
}

impl Default for MprisSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}
