use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{info, info_span, warn};

use crate::audio::{
    MediaOptions, PlaybackController, PlaybackTimings, RodioEngine, SharedController,
};
use crate::config::Settings;
use crate::error::Result;
use crate::library::LibraryIndex;
use crate::nav::NavigationState;
use crate::prefs::Preferences;

/// Library and navigation seeded from the stored discovery cache.
pub fn build_navigation(settings: &Settings, prefs: &Preferences) -> NavigationState {
    let library = LibraryIndex::from_prefs(&settings.library, prefs, info_span!("library"));
    NavigationState::new(library)
}

/// Pick the first directory to show: the command-line argument, then the
/// last directory if it still exists, then the root view. An empty
/// discovery cache triggers a scan before the root view is shown.
pub fn open_initial_view(
    nav: &mut NavigationState,
    start_dir: Option<&Path>,
    last_directory: Option<&Path>,
) {
    if let Some(dir) = start_dir {
        match nav.open(dir) {
            Ok(()) => return,
            Err(e) => warn!(error = %e, "cannot open start directory"),
        }
    }

    if let Some(dir) = last_directory
        && dir.is_dir()
    {
        match nav.open(dir) {
            Ok(()) => return,
            Err(e) => warn!(error = %e, "cannot reopen last directory"),
        }
    }

    if nav.library().discovered().is_empty() {
        let added = nav.rescan();
        info!(added, "initial discovery");
    }
    nav.show_root();
}

pub fn build_controller(
    settings: &Settings,
    prefs: &Preferences,
) -> Result<SharedController<RodioEngine>> {
    let engine = RodioEngine::open()?;
    let controller = PlaybackController::new(
        engine,
        MediaOptions::from(&settings.engine),
        PlaybackTimings::from(&settings.playback),
        prefs.volume,
        prefs.repeat_mode,
        info_span!("playback"),
    );
    Ok(Arc::new(Mutex::new(controller)))
}
