use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{Span, debug, info, warn};

use crate::config::PlaybackSettings;
use crate::error::{Error, PlaybackFailure};
use crate::library::Track;

use super::engine::{MediaEngine, MediaOptions};
use super::types::{
    Observation, PlaybackState, RepeatMode, SessionSnapshot, SnapshotHandle, TransientMessage,
};

const SEEK_TOLERANCE_MS: u64 = 1000;

/// Waits used while driving the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTimings {
    pub play_settle: Duration,
    pub seek_settle: Duration,
    pub time_retry: Duration,
    pub error_ttl: Duration,
}

impl From<&PlaybackSettings> for PlaybackTimings {
    fn from(s: &PlaybackSettings) -> Self {
        Self {
            play_settle: Duration::from_millis(s.play_settle_ms),
            seek_settle: Duration::from_millis(s.seek_settle_ms),
            time_retry: Duration::from_millis(s.time_retry_ms),
            error_ttl: Duration::from_millis(s.error_ttl_ms),
        }
    }
}

/// Owns the playback session and the engine.
///
/// Every command is synchronous and leaves the session consistent; failures
/// are logged and recorded as a transient error instead of being returned.
/// After each command a copy of the session is published to the snapshot
/// handle.
pub struct PlaybackController<E: MediaEngine> {
    engine: E,
    options: MediaOptions,
    timings: PlaybackTimings,
    state: PlaybackState,
    tracks: Vec<Track>,
    playlist_dir: Option<PathBuf>,
    current: Option<usize>,
    media: Option<(PathBuf, E::Media)>,
    volume: u8,
    repeat_mode: RepeatMode,
    last_error: Option<TransientMessage>,
    shared: SnapshotHandle,
    span: Span,
}

impl<E: MediaEngine> PlaybackController<E> {
    pub fn new(
        engine: E,
        options: MediaOptions,
        timings: PlaybackTimings,
        volume: i32,
        repeat_mode: RepeatMode,
        span: Span,
    ) -> Self {
        let mut ctl = Self {
            engine,
            options,
            timings,
            state: PlaybackState::Stopped,
            tracks: Vec::new(),
            playlist_dir: None,
            current: None,
            media: None,
            volume: clamp_volume(volume),
            repeat_mode,
            last_error: None,
            shared: Arc::new(Mutex::new(SessionSnapshot::default())),
            span,
        };
        let volume = ctl.volume;
        ctl.engine.set_volume(volume);
        ctl.publish();
        ctl
    }

    pub fn snapshot_handle(&self) -> SnapshotHandle {
        Arc::clone(&self.shared)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    #[cfg(test)]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    #[cfg(test)]
    pub fn last_error(&self) -> Option<&TransientMessage> {
        self.last_error.as_ref()
    }

    /// Replace the active track list. Playback of the old list is stopped.
    pub fn set_tracks(&mut self, dir: Option<PathBuf>, tracks: Vec<Track>) {
        if self.playlist_dir == dir && self.tracks == tracks {
            return;
        }
        let _span = self.span.clone().entered();
        self.halt();
        debug!(dir = ?dir, count = tracks.len(), "track list replaced");
        self.playlist_dir = dir;
        self.tracks = tracks;
        self.current = None;
        self.publish();
    }

    /// Start or resume playback.
    ///
    /// `None` resumes the loaded track, or starts the first one. While
    /// playing, a different index switches tracks and the same index is a
    /// no-op.
    pub fn play(&mut self, index: Option<usize>) {
        let _span = self.span.clone().entered();
        if self.tracks.is_empty() {
            debug!("play ignored, no tracks");
            return;
        }
        if let Some(i) = index
            && i >= self.tracks.len()
        {
            warn!(index = i, count = self.tracks.len(), "track index out of range");
            return;
        }

        let same = index.is_none() || index == self.current;
        match self.state {
            PlaybackState::Playing if same => return,
            PlaybackState::Playing => self.halt(),
            PlaybackState::Paused if same && self.current.is_some() => {
                self.resume();
                self.publish();
                return;
            }
            _ => {}
        }

        let target = index.or(self.current).unwrap_or(0);
        self.start(target);
        self.publish();
    }

    /// Pause when `index` is the track playing, resume it when paused,
    /// otherwise play `index`.
    pub fn toggle_play_pause(&mut self, index: usize) {
        match self.state {
            PlaybackState::Playing if self.current == Some(index) => self.pause(),
            PlaybackState::Paused if self.current == Some(index) => self.play(None),
            _ => self.play(Some(index)),
        }
    }

    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let _span = self.span.clone().entered();
        self.engine.pause();
        self.state = PlaybackState::Paused;
        debug!("paused");
        self.publish();
    }

    pub fn stop(&mut self) {
        let _span = self.span.clone().entered();
        self.engine.stop();
        if self.state != PlaybackState::Stopped {
            debug!("stopped");
        }
        self.state = PlaybackState::Stopped;
        self.publish();
    }

    /// Move the position by `delta_secs`. Only acts while playing.
    pub fn seek(&mut self, delta_secs: i64) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let _span = self.span.clone().entered();

        let mut current = self.engine.time_ms();
        if current < 0 {
            thread::sleep(self.timings.time_retry);
            current = self.engine.time_ms();
        }
        let target = current
            .max(0)
            .saturating_add(delta_secs.saturating_mul(1000))
            .max(0);

        if let Err(e) = self.seek_and_settle(target) {
            warn!(error = %e, "seek failed");
            self.record_error(&e);
            self.publish();
            return;
        }

        let mut actual = self.engine.time_ms();
        if actual.abs_diff(target) > SEEK_TOLERANCE_MS {
            debug!(target, actual, "seek landed off target, retrying");
            if let Err(e) = self.seek_and_settle(target) {
                warn!(error = %e, "seek retry failed");
            }
            actual = self.engine.time_ms();
            if actual.abs_diff(target) > SEEK_TOLERANCE_MS {
                let err = Error::Seek {
                    target_ms: target,
                    actual_ms: actual,
                };
                warn!(error = %err, "seek imprecise");
                self.record_error(&err);
            }
        }
        self.publish();
    }

    /// Advance with wrap-around. Without a current track, start at the first.
    pub fn next(&mut self) {
        let n = self.tracks.len();
        if n == 0 {
            return;
        }
        let target = match self.current {
            Some(i) => (i + 1) % n,
            None => 0,
        };
        self.switch_to(target);
    }

    /// Go back with wrap-around. Without a current track, start at the last.
    pub fn previous(&mut self) {
        let n = self.tracks.len();
        if n == 0 {
            return;
        }
        let target = match self.current {
            Some(i) => (i + n - 1) % n,
            None => n - 1,
        };
        self.switch_to(target);
    }

    /// Restart the current track from the beginning.
    pub fn replay(&mut self) {
        match self.current {
            Some(i) if i < self.tracks.len() => self.switch_to(i),
            _ => self.next(),
        }
    }

    pub fn set_volume(&mut self, volume: i32) {
        self.volume = clamp_volume(volume);
        self.engine.set_volume(self.volume);
        self.publish();
    }

    pub fn toggle_repeat(&mut self) {
        self.repeat_mode = self.repeat_mode.cycle();
        self.span
            .in_scope(|| info!(mode = self.repeat_mode.label(), "repeat mode changed"));
        self.publish();
    }

    /// Session state plus what the engine reports right now.
    pub fn observe(&self) -> Observation {
        Observation {
            state: self.state,
            engine_playing: self.engine.is_playing(),
            time_ms: self.engine.time_ms(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let track = self.current.and_then(|i| self.tracks.get(i)).cloned();
        let (position_ms, length_ms) = if self.state == PlaybackState::Stopped {
            (0, -1)
        } else {
            (self.engine.time_ms(), self.engine.length_ms())
        };
        SessionSnapshot {
            state: self.state,
            current_track: self.current,
            track,
            track_count: self.tracks.len(),
            playlist_dir: self.playlist_dir.clone(),
            volume: self.volume,
            repeat_mode: self.repeat_mode,
            last_error: self.last_error.clone(),
            position_ms,
            length_ms,
        }
    }

    /// Publish a fresh snapshot without changing anything.
    pub fn refresh(&mut self) {
        self.publish();
    }

    pub fn shutdown(&mut self) {
        self.stop();
    }

    pub fn release_engine(&mut self) {
        self.media = None;
        self.engine.release();
        self.span.in_scope(|| debug!("engine released"));
    }

    fn switch_to(&mut self, index: usize) {
        let _span = self.span.clone().entered();
        self.halt();
        self.start(index);
        self.publish();
    }

    fn halt(&mut self) {
        if self.state != PlaybackState::Stopped {
            self.engine.stop();
            self.state = PlaybackState::Stopped;
        }
    }

    fn resume(&mut self) {
        match self.engine.play() {
            Ok(()) => {
                self.state = PlaybackState::Playing;
                debug!("resumed");
            }
            Err(e) => {
                let path = self.current_path().unwrap_or_default();
                self.fail(path, PlaybackFailure::Engine(e.to_string()));
            }
        }
    }

    fn start(&mut self, index: usize) {
        let path = self.tracks[index].path.clone();
        self.current = Some(index);
        match self.try_start(&path) {
            Ok(()) => {
                self.state = PlaybackState::Playing;
                self.last_error = None;
                info!(index, path = %path.display(), "playing");
            }
            Err(failure) => self.fail(path, failure),
        }
    }

    fn try_start(&mut self, path: &Path) -> Result<(), PlaybackFailure> {
        check_file(path)?;

        let loaded = matches!(&self.media, Some((p, _)) if p == path);
        if !loaded {
            self.media = None;
            debug!(options = ?self.options.option_strings(), "creating media");
            let media = self
                .engine
                .new_media(path, &self.options)
                .map_err(engine_failure)?;
            self.media = Some((path.to_path_buf(), media));
        }
        if let Some((_, media)) = &self.media {
            self.engine.set_media(media).map_err(engine_failure)?;
        }
        self.engine.set_volume(self.volume);
        self.engine.play().map_err(engine_failure)?;
        self.confirm_playing()
    }

    fn confirm_playing(&self) -> Result<(), PlaybackFailure> {
        for attempt in 1..=2 {
            thread::sleep(self.timings.play_settle);
            if self.engine.is_playing() {
                return Ok(());
            }
            debug!(attempt, "engine not playing yet");
        }
        Err(PlaybackFailure::NotConfirmed)
    }

    fn fail(&mut self, path: PathBuf, failure: PlaybackFailure) {
        self.engine.stop();
        self.state = PlaybackState::Stopped;
        let err = Error::Playback { path, failure };
        warn!(error = %err, "playback failed");
        self.record_error(&err);
    }

    fn seek_and_settle(&mut self, target: i64) -> crate::error::Result<()> {
        self.engine.set_time_ms(target)?;
        thread::sleep(self.timings.seek_settle);
        Ok(())
    }

    fn record_error(&mut self, err: &Error) {
        self.last_error = Some(TransientMessage::new(
            err.user_message(),
            self.timings.error_ttl,
        ));
    }

    fn current_path(&self) -> Option<PathBuf> {
        self.current
            .and_then(|i| self.tracks.get(i))
            .map(|t| t.path.clone())
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        if let Ok(mut shared) = self.shared.lock() {
            *shared = snapshot;
        }
    }
}

pub fn clamp_volume(volume: i32) -> u8 {
    volume.clamp(0, 100) as u8
}

fn engine_failure(e: Error) -> PlaybackFailure {
    PlaybackFailure::Engine(e.to_string())
}

fn check_file(path: &Path) -> Result<(), PlaybackFailure> {
    let meta = fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PlaybackFailure::Missing,
        _ => PlaybackFailure::Unreadable,
    })?;
    if !meta.is_file() {
        return Err(PlaybackFailure::Missing);
    }
    File::open(path).map_err(|_| PlaybackFailure::Unreadable)?;
    if meta.len() == 0 {
        return Err(PlaybackFailure::Empty);
    }
    Ok(())
}
