//! Error types shared by the library index, the preference store and the
//! playback controller.
//!
//! None of these are fatal: every boundary logs them and, for user-initiated
//! operations, turns them into a short transient message.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Preference file could not be read, parsed or written.
    #[error("preferences at {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    /// Navigation into a path that is missing or not a readable directory.
    #[error("not a readable directory: {path} ({reason})")]
    InvalidDirectory { path: PathBuf, reason: String },

    /// A track could not be started.
    #[error("cannot play {path}: {failure}")]
    Playback {
        path: PathBuf,
        #[source]
        failure: PlaybackFailure,
    },

    /// The engine reports a position far from the requested one.
    #[error("seek to {target_ms}ms landed at {actual_ms}ms")]
    Seek { target_ms: i64, actual_ms: i64 },

    /// A discovery walk failed on a subtree.
    #[error("discovery failed under {path}: {reason}")]
    Discovery { path: PathBuf, reason: String },

    /// A call into the media engine failed.
    #[error("engine: {0}")]
    Engine(String),
}

/// Why a track could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackFailure {
    #[error("file does not exist")]
    Missing,
    #[error("file is not readable")]
    Unreadable,
    #[error("file is empty")]
    Empty,
    #[error("engine did not confirm playback")]
    NotConfirmed,
    #[error("{0}")]
    Engine(String),
}

impl Error {
    /// Short text for the status line.
    pub fn user_message(&self) -> String {
        match self {
            Error::Config { .. } => "Could not access preferences".to_string(),
            Error::InvalidDirectory { .. } => "Invalid directory".to_string(),
            Error::Playback { failure, .. } => match failure {
                PlaybackFailure::Missing => "File does not exist".to_string(),
                PlaybackFailure::Unreadable => "No permission to read file".to_string(),
                PlaybackFailure::Empty => "File is empty".to_string(),
                PlaybackFailure::NotConfirmed => "Could not play file".to_string(),
                PlaybackFailure::Engine(msg) => format!("Playback error: {msg}"),
            },
            Error::Seek { .. } => "Could not change position".to_string(),
            Error::Discovery { .. } => "Discovery failed".to_string(),
            Error::Engine(msg) => format!("Engine error: {msg}"),
        }
    }
}
