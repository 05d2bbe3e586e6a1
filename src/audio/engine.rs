//! The contract between the playback controller and whatever produces sound.

use std::path::Path;

use crate::config::EngineSettings;
use crate::error::Result;

/// Decoding hints attached to every media object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaOptions {
    pub time_stretch: bool,
    pub resample: bool,
    pub file_caching_ms: u32,
    pub network_caching_ms: u32,
}

impl Default for MediaOptions {
    fn default() -> Self {
        Self::from(&EngineSettings::default())
    }
}

impl From<&EngineSettings> for MediaOptions {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            time_stretch: settings.time_stretch,
            resample: settings.resample,
            file_caching_ms: settings.file_caching_ms,
            network_caching_ms: settings.network_caching_ms,
        }
    }
}

impl MediaOptions {
    /// The hints in their conventional command-line spelling, for logs.
    pub fn option_strings(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(5);
        if !self.time_stretch {
            out.push("--no-audio-time-stretch".to_string());
            out.push("--no-video-time-stretch".to_string());
        }
        if !self.resample {
            out.push("--no-audio-resample".to_string());
        }
        out.push(format!("--file-caching={}", self.file_caching_ms));
        out.push(format!("--network-caching={}", self.network_caching_ms));
        out
    }
}

/// An audio backend driven by [`PlaybackController`](super::PlaybackController).
///
/// Times are milliseconds; `-1` means "unknown". One engine instance lives for
/// the whole process and is released exactly once at shutdown.
pub trait MediaEngine: Send {
    /// A loaded track that can be handed to [`set_media`](Self::set_media)
    /// again to replay it.
    type Media: Send;

    fn new_media(&mut self, path: &Path, options: &MediaOptions) -> Result<Self::Media>;
    fn set_media(&mut self, media: &Self::Media) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    fn time_ms(&self) -> i64;
    fn set_time_ms(&mut self, ms: i64) -> Result<()>;
    fn length_ms(&self) -> i64;
    fn set_volume(&mut self, volume: u8);
    fn release(&mut self);
}
