use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tempfile::TempDir;
use tracing::Span;

use super::*;
use crate::audio::mock::{Call, MockEngine, immediate_timings, transport};
use crate::audio::{MediaOptions, PlaybackController, PlaybackState, RepeatMode};
use crate::config::{LibrarySettings, PlaybackSettings};
use crate::library::LibraryIndex;
use crate::nav::NavigationState;
use crate::prefs::{PreferenceStore, Preferences};

struct Harness {
    root: TempDir,
    engine: MockEngine,
    app: App<MockEngine>,
    prefs_path: PathBuf,
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"audio").unwrap();
}

/// `album/` holds one subfolder and three tracks; the app starts inside it.
fn harness() -> Harness {
    let root = tempfile::Builder::new()
        .prefix("jukebox-app")
        .tempdir()
        .unwrap();
    let album = root.path().join("album");
    touch(&album.join("bonus/x.mp3"));
    for name in ["a.mp3", "b.mp3", "c.mp3"] {
        touch(&album.join(name));
    }

    let settings = LibrarySettings {
        discovery_roots: vec![root.path().to_path_buf()],
        ..LibrarySettings::default()
    };
    let mut nav = NavigationState::new(LibraryIndex::new(&settings, Span::none()));
    nav.open(&album).unwrap();

    let engine = MockEngine::new();
    let ctl = PlaybackController::new(
        engine.clone(),
        MediaOptions::default(),
        immediate_timings(),
        50,
        RepeatMode::Off,
        Span::none(),
    );
    let prefs_path = root.path().join("state").join("preferences.json");
    let app = App::new(
        nav,
        Arc::new(Mutex::new(ctl)),
        Some(PreferenceStore::new(&prefs_path)),
        &PlaybackSettings::default(),
    );
    Harness {
        root,
        engine,
        app,
        prefs_path,
    }
}

impl Harness {
    fn album(&self) -> PathBuf {
        self.root.path().join("album")
    }

    fn saved(&self) -> Preferences {
        PreferenceStore::new(&self.prefs_path).load().unwrap()
    }

    /// Put the cursor on track `i` of the open directory.
    fn select_track(&mut self, i: usize) {
        self.app.nav_mut().select_track(i);
    }
}

#[test]
fn toggle_on_a_track_plays_then_pauses() {
    let mut h = harness();
    h.select_track(1);

    h.app.handle(Input::TogglePlay);
    let snap = h.app.snapshot();
    assert_eq!(snap.state, PlaybackState::Playing);
    assert_eq!(snap.current_track, Some(1));
    assert_eq!(snap.playlist_dir.as_deref(), Some(h.album().as_path()));
    assert_eq!(snap.track_count, 3);

    h.app.handle(Input::TogglePlay);
    assert_eq!(h.app.snapshot().state, PlaybackState::Paused);
}

#[test]
fn toggle_on_a_folder_does_nothing() {
    let mut h = harness();
    assert_eq!(h.app.nav().selected(), 0);

    h.app.handle(Input::TogglePlay);
    assert_eq!(h.app.snapshot().state, PlaybackState::Stopped);
    assert!(h.engine.calls().iter().all(|c| matches!(c, Call::SetVolume(_))));
}

#[test]
fn next_moves_the_cursor_with_playback() {
    let mut h = harness();
    h.select_track(0);
    h.app.handle(Input::TogglePlay);

    h.app.handle(Input::Next);
    assert_eq!(h.app.snapshot().current_track, Some(1));
    assert_eq!(h.app.nav().selected_track_index(), Some(1));

    h.app.handle(Input::Previous);
    h.app.handle(Input::Previous);
    assert_eq!(h.app.snapshot().current_track, Some(2));
    assert_eq!(h.app.nav().selected_track_index(), Some(2));
}

#[test]
fn cursor_stays_put_when_browsing_elsewhere() {
    let mut h = harness();
    h.select_track(0);
    h.app.handle(Input::TogglePlay);

    h.app.handle(Input::Up);
    h.app.handle(Input::Enter);
    assert_eq!(
        h.app.nav().current_directory(),
        Some(h.album().join("bonus").as_path())
    );

    h.app.handle(Input::Next);
    assert_eq!(h.app.nav().selected(), 0);
    assert_eq!(h.app.snapshot().current_track, Some(1));
}

#[test]
fn seek_keys_only_act_while_playing() {
    let mut h = harness();
    h.app.handle(Input::SeekForward);
    assert!(!h.engine.calls().iter().any(|c| matches!(c, Call::SetTime(_))));

    h.select_track(0);
    h.app.handle(Input::TogglePlay);
    h.engine.set_position(20_000);
    h.app.handle(Input::SeekBackward);
    assert_eq!(h.engine.calls().last(), Some(&Call::SetTime(10_000)));
}

#[test]
fn volume_changes_are_clamped_and_persisted() {
    let mut h = harness();
    for _ in 0..7 {
        h.app.handle(Input::VolumeUp);
    }
    assert_eq!(h.app.snapshot().volume, 100);
    assert_eq!(h.saved().volume, 100);

    h.app.handle(Input::VolumeDown);
    assert_eq!(h.saved().volume, 90);
}

#[test]
fn repeat_mode_is_persisted() {
    let mut h = harness();
    h.app.handle(Input::CycleRepeat);
    h.app.handle(Input::CycleRepeat);
    assert_eq!(h.app.snapshot().repeat_mode, RepeatMode::Folder);
    assert_eq!(h.saved().repeat_mode, RepeatMode::Folder);
}

#[test]
fn entering_and_leaving_records_last_directory() {
    let mut h = harness();
    h.app.handle(Input::Enter);
    assert_eq!(h.saved().last_directory, Some(h.album().join("bonus")));

    h.app.handle(Input::Back);
    assert_eq!(h.saved().last_directory, Some(h.album()));
}

#[test]
fn entering_a_vanished_folder_shows_a_notice() {
    let mut h = harness();
    fs::remove_dir_all(h.album().join("bonus")).unwrap();

    h.app.handle(Input::Enter);
    assert_eq!(h.app.nav().current_directory(), Some(h.album().as_path()));
    assert_eq!(
        h.app.status_message(Instant::now()).as_deref(),
        Some("Invalid directory")
    );
}

#[test]
fn playback_errors_reach_the_status_line() {
    let mut h = harness();
    fs::remove_file(h.album().join("a.mp3")).unwrap();
    h.select_track(0);

    h.app.handle(Input::TogglePlay);
    assert_eq!(
        h.app.status_message(Instant::now()).as_deref(),
        Some("File does not exist")
    );
}

#[test]
fn rescan_reports_and_persists_discoveries() {
    let mut h = harness();
    h.app.handle(Input::Rescan);

    let msg = h.app.status_message(Instant::now()).unwrap();
    assert_eq!(msg, "Found 2 new music directories");
    assert_eq!(
        h.saved().found_music_dirs,
        vec![h.album(), h.album().join("bonus")]
    );
}

#[test]
fn quit_ends_the_loop() {
    let mut h = harness();
    assert_eq!(h.app.handle(Input::Down), Flow::Continue);
    assert_eq!(h.app.handle(Input::Quit), Flow::Quit);
}

#[test]
fn remote_commands_drive_the_loaded_track() {
    let mut h = harness();
    h.select_track(2);
    h.app.handle(Input::TogglePlay);

    h.app.pause();
    assert_eq!(h.app.snapshot().state, PlaybackState::Paused);
    h.app.resume();
    assert_eq!(h.app.snapshot().state, PlaybackState::Playing);
    h.app.toggle_current();
    assert_eq!(h.app.snapshot().state, PlaybackState::Paused);
    assert_eq!(h.app.snapshot().current_track, Some(2));
}

#[test]
fn shutdown_stops_saves_then_releases() {
    let mut h = harness();
    h.select_track(0);
    h.app.handle(Input::TogglePlay);
    h.engine.clear_calls();

    h.app.shutdown();

    assert_eq!(transport(&h.engine.calls()), vec![Call::Stop, Call::Release]);
    assert!(h.prefs_path.exists());
    assert_eq!(h.app.snapshot().state, PlaybackState::Stopped);
}
