use std::path::PathBuf;
use std::sync::mpsc;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, info_span, warn};

use crate::app::App;
use crate::audio::{ContinuousMonitor, MediaEngine, MonitorHandle, MonitorTimings};
use crate::config::Settings;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::prefs::PreferenceStore;

mod event_loop;
mod mpris_sync;
mod settings;
mod startup;

pub use settings::load_settings;

pub fn run(settings: &Settings, start_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let store = PreferenceStore::resolve(settings.library.prefs_path.as_deref());
    let prefs = store
        .as_ref()
        .map(PreferenceStore::load_or_default)
        .unwrap_or_default();
    info!(
        prefs = ?store.as_ref().map(|s| s.path().display().to_string()),
        volume = prefs.volume,
        repeat = prefs.repeat_mode.label(),
        "preferences loaded"
    );

    let mut nav = startup::build_navigation(settings, &prefs);
    startup::open_initial_view(&mut nav, start_dir.as_deref(), prefs.last_directory.as_deref());

    let controller = startup::build_controller(settings, &prefs)?;
    let mut monitor = ContinuousMonitor::new(
        controller.clone(),
        MonitorTimings::from(&settings.monitor),
        info_span!("monitor"),
    )
    .spawn()?;

    let mut app = App::new(nav, controller, store, &settings.playback);
    app.mark_saved(prefs);
    // Startup may have run discovery or fallen back from a vanished directory.
    app.persist();

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = if settings.mpris.enabled {
        crate::mpris::spawn_mpris(control_tx)
    } else {
        MprisHandle::detached()
    };

    let outcome = run_terminal(settings, &mut app, &mpris, &control_rx);
    wind_down(outcome, &mut monitor, &mut app)
}

/// Stop the monitor and shut playback down whatever the loop returned, so
/// preferences are saved even when the terminal could not be restored.
fn wind_down<E: MediaEngine>(
    outcome: Result<(), Box<dyn std::error::Error>>,
    monitor: &mut MonitorHandle,
    app: &mut App<E>,
) -> Result<(), Box<dyn std::error::Error>> {
    monitor.stop();
    app.shutdown();
    outcome
}

fn run_terminal<E: MediaEngine>(
    settings: &Settings,
    app: &mut App<E>,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let outcome = run_screen(settings, app, mpris, control_rx);
    restore_terminal();
    outcome
}

fn run_screen<E: MediaEngine>(
    settings: &Settings,
    app: &mut App<E>,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::new();
    let outcome = event_loop::run(&mut terminal, settings, app, mpris, control_rx, &mut state);

    if let Err(e) = terminal.show_cursor() {
        warn!(error = %e, "cannot show cursor");
    }
    outcome
}

fn restore_terminal() {
    if let Err(e) = disable_raw_mode() {
        warn!(error = %e, "cannot leave raw mode");
    }
    if let Err(e) = execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen) {
        warn!(error = %e, "cannot leave alternate screen");
    }
}
