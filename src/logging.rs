//! File logging. The terminal belongs to the UI, so everything goes to a
//! daily rolling file.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

const LOG_FILE: &str = "jukebox.log";

/// `logging.dir`, else `$XDG_STATE_HOME/jukebox`, else the cache dir.
pub fn log_dir(settings: &LoggingSettings) -> Option<PathBuf> {
    if let Some(dir) = &settings.dir {
        return Some(dir.clone());
    }
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|d| d.join("jukebox"))
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// or buffered lines are lost.
pub fn init(settings: &LoggingSettings) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let dir = log_dir(settings).ok_or("no directory for the log file")?;
    std::fs::create_dir_all(&dir)?;

    let file_appender = tracing_appender::rolling::daily(&dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}
