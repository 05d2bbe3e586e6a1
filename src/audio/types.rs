//! Playback session types shared by the controller, the monitor and the UI.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::library::Track;

use super::controller::PlaybackController;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
        }
    }
}

/// What happens when a track ends. Persisted as `0`, `1` or `2`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RepeatMode {
    /// Continue with the next track, wrapping at the end of the list.
    #[default]
    Off,
    /// Play the same track again.
    Track,
    /// Continue with the next track, wrapping at the end of the folder.
    Folder,
}

impl RepeatMode {
    /// Off -> Track -> Folder -> Off.
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::Track,
            Self::Track => Self::Folder,
            Self::Folder => Self::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Track => "Track",
            Self::Folder => "Folder",
        }
    }
}

impl From<RepeatMode> for u8 {
    fn from(mode: RepeatMode) -> Self {
        match mode {
            RepeatMode::Off => 0,
            RepeatMode::Track => 1,
            RepeatMode::Folder => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRepeatMode(pub u8);

impl fmt::Display for UnknownRepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown repeat mode {}", self.0)
    }
}

impl TryFrom<u8> for RepeatMode {
    type Error = UnknownRepeatMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::Track),
            2 => Ok(Self::Folder),
            other => Err(UnknownRepeatMode(other)),
        }
    }
}

/// A status line message that disappears after its time-to-live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientMessage {
    pub text: String,
    pub expires_at: Instant,
}

impl TransientMessage {
    pub fn new(text: impl Into<String>, ttl: Duration) -> Self {
        Self {
            text: text.into(),
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_active(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Copy of the session published for rendering and remote control.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub current_track: Option<usize>,
    pub track: Option<Track>,
    pub track_count: usize,
    pub playlist_dir: Option<PathBuf>,
    pub volume: u8,
    pub repeat_mode: RepeatMode,
    pub last_error: Option<TransientMessage>,
    pub position_ms: i64,
    pub length_ms: i64,
}

impl SessionSnapshot {
    /// The error text, if it has not expired yet.
    pub fn active_error(&self, now: Instant) -> Option<&str> {
        self.last_error
            .as_ref()
            .filter(|m| m.is_active(now))
            .map(|m| m.text.as_str())
    }
}

/// What the monitor needs to know each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub state: PlaybackState,
    pub engine_playing: bool,
    pub time_ms: i64,
}

pub type SnapshotHandle = Arc<Mutex<SessionSnapshot>>;
pub type SharedController<E> = Arc<Mutex<PlaybackController<E>>>;
