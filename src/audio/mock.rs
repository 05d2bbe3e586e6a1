//! Recording engine for controller, monitor and app tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{Error, Result};

use super::controller::PlaybackTimings;
use super::engine::{MediaEngine, MediaOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    NewMedia(PathBuf),
    SetMedia(PathBuf),
    Play,
    Pause,
    Stop,
    SetTime(i64),
    SetVolume(u8),
    Release,
}

#[derive(Debug)]
pub struct MockState {
    pub calls: Vec<Call>,
    pub playing: bool,
    pub time_ms: i64,
    pub length_ms: i64,
    /// Whether `play` actually makes the engine report playing.
    pub confirm_playback: bool,
    /// Offsets applied to successive seeks; empty means exact seeks.
    pub seek_drifts: VecDeque<i64>,
    pub fail_new_media: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            playing: false,
            time_ms: 0,
            length_ms: 180_000,
            confirm_playback: true,
            seek_drifts: VecDeque::new(),
            fail_new_media: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Simulate the engine running out of audio at `at_ms`.
    pub fn finish_track(&self, at_ms: i64) {
        let mut s = self.state();
        s.playing = false;
        s.time_ms = at_ms;
    }

    pub fn set_position(&self, ms: i64) {
        self.state().time_ms = ms;
    }

    fn record(&self, call: Call) -> MutexGuard<'_, MockState> {
        let mut s = self.state();
        s.calls.push(call);
        s
    }
}

impl MediaEngine for MockEngine {
    type Media = PathBuf;

    fn new_media(&mut self, path: &Path, _options: &MediaOptions) -> Result<PathBuf> {
        let s = self.record(Call::NewMedia(path.to_path_buf()));
        if s.fail_new_media {
            return Err(Error::Engine("cannot decode".to_string()));
        }
        Ok(path.to_path_buf())
    }

    fn set_media(&mut self, media: &PathBuf) -> Result<()> {
        let mut s = self.record(Call::SetMedia(media.clone()));
        s.time_ms = 0;
        s.playing = false;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let mut s = self.record(Call::Play);
        s.playing = s.confirm_playback;
        Ok(())
    }

    fn pause(&mut self) {
        self.record(Call::Pause).playing = false;
    }

    fn stop(&mut self) {
        let mut s = self.record(Call::Stop);
        s.playing = false;
        s.time_ms = 0;
    }

    fn is_playing(&self) -> bool {
        self.state().playing
    }

    fn time_ms(&self) -> i64 {
        self.state().time_ms
    }

    fn set_time_ms(&mut self, ms: i64) -> Result<()> {
        let mut s = self.record(Call::SetTime(ms));
        let drift = s.seek_drifts.pop_front().unwrap_or(0);
        s.time_ms = ms + drift;
        Ok(())
    }

    fn length_ms(&self) -> i64 {
        self.state().length_ms
    }

    fn set_volume(&mut self, volume: u8) {
        self.record(Call::SetVolume(volume));
    }

    fn release(&mut self) {
        let mut s = self.record(Call::Release);
        s.playing = false;
    }
}

/// Timings that never sleep.
pub fn immediate_timings() -> PlaybackTimings {
    PlaybackTimings {
        play_settle: Duration::ZERO,
        seek_settle: Duration::ZERO,
        time_retry: Duration::ZERO,
        error_ttl: Duration::from_secs(3),
    }
}

/// Only the calls that change what is audible.
pub fn transport(calls: &[Call]) -> Vec<Call> {
    calls
        .iter()
        .filter(|c| !matches!(c, Call::SetVolume(_)))
        .cloned()
        .collect()
}
