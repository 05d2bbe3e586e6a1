use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::audio::{
    MediaEngine, PlaybackController, PlaybackState, SessionSnapshot, SharedController,
    SnapshotHandle, TransientMessage,
};
use crate::config::PlaybackSettings;
use crate::nav::{Entry, NavigationState};
use crate::prefs::{PreferenceStore, Preferences};

/// Everything the user can ask for from the list view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Input {
    Up,
    Down,
    SeekForward,
    SeekBackward,
    TogglePlay,
    Enter,
    Back,
    VolumeUp,
    VolumeDown,
    CycleRepeat,
    Next,
    Previous,
    Stop,
    Rescan,
    Quit,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The main application model.
pub struct App<E: MediaEngine> {
    nav: NavigationState,
    controller: SharedController<E>,
    snapshot: SnapshotHandle,
    store: Option<PreferenceStore>,
    saved: Option<Preferences>,
    seek_seconds: i64,
    volume_step: i32,
    notice: Option<TransientMessage>,
    notice_ttl: Duration,
    followed: Option<usize>,
}

impl<E: MediaEngine> App<E> {
    pub fn new(
        nav: NavigationState,
        controller: SharedController<E>,
        store: Option<PreferenceStore>,
        settings: &PlaybackSettings,
    ) -> Self {
        let snapshot = match controller.lock() {
            Ok(ctl) => ctl.snapshot_handle(),
            Err(poisoned) => poisoned.into_inner().snapshot_handle(),
        };
        Self {
            nav,
            controller,
            snapshot,
            store,
            saved: None,
            seek_seconds: i64::try_from(settings.seek_seconds).unwrap_or(i64::MAX),
            volume_step: i32::from(settings.volume_step),
            notice: None,
            notice_ttl: Duration::from_millis(settings.error_ttl_ms),
            followed: None,
        }
    }

    pub fn nav(&self) -> &NavigationState {
        &self.nav
    }

    #[cfg(test)]
    pub fn nav_mut(&mut self) -> &mut NavigationState {
        &mut self.nav
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// The most recent message for the status line, if still active. Playback
    /// errors win over navigation notices.
    pub fn status_message(&self, now: Instant) -> Option<String> {
        let snap = self.snapshot();
        if let Some(text) = snap.active_error(now) {
            return Some(text.to_string());
        }
        self.notice
            .as_ref()
            .filter(|n| n.is_active(now))
            .map(|n| n.text.clone())
    }

    pub fn handle(&mut self, input: Input) -> Flow {
        debug!(?input, "input");
        match input {
            Input::Up => self.nav.move_up(),
            Input::Down => self.nav.move_down(),
            Input::SeekForward => {
                let delta = self.seek_seconds;
                self.with_controller(|c| c.seek(delta));
            }
            Input::SeekBackward => {
                let delta = -self.seek_seconds;
                self.with_controller(|c| c.seek(delta));
            }
            Input::TogglePlay => self.toggle_selected(),
            Input::Enter => self.enter(),
            Input::Back => {
                self.nav.back();
                self.persist();
            }
            Input::VolumeUp => self.change_volume(self.volume_step),
            Input::VolumeDown => self.change_volume(-self.volume_step),
            Input::CycleRepeat => {
                self.with_controller(|c| c.toggle_repeat());
                self.persist();
            }
            Input::Next => {
                self.with_controller(|c| c.next());
            }
            Input::Previous => {
                self.with_controller(|c| c.previous());
            }
            Input::Stop => {
                self.with_controller(|c| c.stop());
            }
            Input::Rescan => self.rescan(),
            Input::Quit => return Flow::Quit,
        }
        self.follow_playback();
        Flow::Continue
    }

    /// Remote "play": resume or start the loaded list.
    pub fn resume(&mut self) {
        self.with_controller(|c| c.play(None));
        self.follow_playback();
    }

    /// Remote "pause".
    pub fn pause(&mut self) {
        self.with_controller(|c| c.pause());
    }

    /// Remote "play/pause" on the loaded track, not the selection.
    pub fn toggle_current(&mut self) {
        self.with_controller(|c| match c.state() {
            PlaybackState::Playing => c.pause(),
            _ => c.play(None),
        });
        self.follow_playback();
    }

    /// Keep the cursor on the playing track when it is from the open directory.
    ///
    /// Only reacts when the playing track changes, so the user can still move
    /// the cursor away while a track plays.
    pub fn follow_playback(&mut self) {
        let snap = self.snapshot();
        if snap.current_track == self.followed {
            return;
        }
        self.followed = snap.current_track;
        let Some(index) = snap.current_track else {
            return;
        };
        if snap.playlist_dir.is_some()
            && snap.playlist_dir.as_deref() == self.nav.current_directory()
        {
            self.nav.select_track(index);
        }
    }

    /// Write volume, repeat mode, last directory and the discovery cache if
    /// anything changed since the last save.
    pub fn persist(&mut self) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let mut prefs = self.saved.clone().unwrap_or_default();
        if let Some((volume, mode)) = self.with_controller(|c| (c.volume(), c.repeat_mode())) {
            prefs.volume = i32::from(volume);
            prefs.repeat_mode = mode;
        }
        self.nav.library().write_prefs(&mut prefs);

        if self.saved.as_ref() == Some(&prefs) {
            return;
        }
        match store.save(&prefs) {
            Ok(()) => self.saved = Some(prefs),
            Err(e) => {
                warn!(error = %e, "cannot save preferences");
                self.set_notice(e.user_message());
            }
        }
    }

    /// Record what is already on disk so unchanged state is not rewritten.
    pub fn mark_saved(&mut self, prefs: Preferences) {
        self.saved = Some(prefs);
    }

    /// Stop playback, save preferences, release the engine.
    pub fn shutdown(&mut self) {
        self.with_controller(|c| c.shutdown());
        self.persist();
        self.with_controller(|c| c.release_engine());
        info!("shutdown complete");
    }

    fn toggle_selected(&mut self) {
        let Some(index) = self.nav.selected_track_index() else {
            return;
        };
        let dir = self.nav.current_directory().map(|d| d.to_path_buf());
        let tracks = self.nav.tracks().to_vec();
        self.with_controller(|c| {
            c.set_tracks(dir, tracks);
            c.toggle_play_pause(index);
        });
    }

    fn enter(&mut self) {
        if !matches!(self.nav.selected_entry(), Some(Entry::Folder(_))) {
            return;
        }
        match self.nav.enter() {
            Ok(_) => {
                self.followed = None;
                self.persist();
            }
            Err(e) => self.set_notice(e.user_message()),
        }
    }

    fn change_volume(&mut self, delta: i32) {
        self.with_controller(|c| {
            let volume = i32::from(c.volume()) + delta;
            c.set_volume(volume);
        });
        self.persist();
    }

    fn rescan(&mut self) {
        self.set_notice("Searching for music...".to_string());
        let added = self.nav.rescan();
        let text = match added {
            0 => "No new music directories".to_string(),
            1 => "Found 1 new music directory".to_string(),
            n => format!("Found {n} new music directories"),
        };
        self.set_notice(text);
        self.persist();
    }

    fn set_notice(&mut self, text: String) {
        self.notice = Some(TransientMessage::new(text, self.notice_ttl));
    }

    fn with_controller<R>(&self, f: impl FnOnce(&mut PlaybackController<E>) -> R) -> Option<R> {
        match self.controller.lock() {
            Ok(mut ctl) => Some(f(&mut ctl)),
            Err(_) => {
                warn!("playback controller lock poisoned");
                None
            }
        }
    }
}
