use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};

mod app;
mod audio;
mod config;
mod error;
mod library;
mod logging;
mod mpris;
mod nav;
mod prefs;
mod runtime;
mod ui;

fn main() -> ExitCode {
    let start_dir = env::args_os().nth(1).map(PathBuf::from);
    let settings = runtime::load_settings();

    let guard = match logging::init(&settings.logging) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("jukebox: logging disabled: {e}");
            None
        }
    };
    info!(version = env!("CARGO_PKG_VERSION"), "starting");

    let result = runtime::run(&settings, start_dir);
    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal");
            eprintln!("jukebox: {e}");
            ExitCode::FAILURE
        }
    };
    drop(guard);
    code
}
