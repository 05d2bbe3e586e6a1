use std::collections::BTreeSet;
use std::env;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::Error;

use super::scan::{has_hidden_component, is_audio_file, is_hidden, normalize_extensions};

const TERMUX_ROOTS: [&str; 4] = [
    "/sdcard/Music",
    "/sdcard/Download",
    "/storage/emulated/0/Music",
    "/storage/emulated/0/Download",
];

/// Where a discovery walk starts on this platform.
///
/// Termux gets its fixed shared-storage folders, a process running as root
/// walks the whole filesystem, everyone else walks their home directory.
pub fn default_roots() -> Vec<PathBuf> {
    if is_termux() {
        return TERMUX_ROOTS
            .iter()
            .map(PathBuf::from)
            .filter(|p| p.is_dir())
            .collect();
    }
    if is_elevated() {
        return vec![PathBuf::from("/")];
    }
    dirs::home_dir().into_iter().collect()
}

fn is_termux() -> bool {
    env::var("PREFIX")
        .map(|p| p.contains("com.termux"))
        .unwrap_or(false)
}

#[cfg(unix)]
fn is_elevated() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_elevated() -> bool {
    false
}

/// Walk `roots` and return every directory that directly contains at least
/// one audio file, sorted and deduplicated.
///
/// Hidden directories are pruned from the walk and any candidate with a
/// hidden component is dropped. Each candidate is checked again after the
/// walk, so directories emptied in the meantime do not show up.
pub fn discover_music_directories(
    roots: &[PathBuf],
    extensions: &[String],
    follow_links: bool,
) -> Vec<PathBuf> {
    let extensions = normalize_extensions(extensions);
    let mut candidates: BTreeSet<PathBuf> = BTreeSet::new();

    for root in roots {
        if has_hidden_component(root) {
            debug!(root = %root.display(), "skipping hidden discovery root");
            continue;
        }
        debug!(root = %root.display(), "discovery walk started");

        let walker = WalkDir::new(root)
            .follow_links(follow_links)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log_walk_error(root, &e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_audio_file(entry.path(), &extensions) {
                continue;
            }
            if let Some(parent) = entry.path().parent() {
                candidates.insert(parent.to_path_buf());
            }
        }
    }

    let found = verify_candidates(candidates, &extensions, follow_links);
    info!(count = found.len(), "discovery finished");
    found
}

/// Keep the candidates that are still visible and still hold music.
/// `extensions` must already be normalized.
pub(super) fn verify_candidates(
    candidates: impl IntoIterator<Item = PathBuf>,
    extensions: &[String],
    follow_links: bool,
) -> Vec<PathBuf> {
    candidates
        .into_iter()
        .filter(|dir| !has_hidden_component(dir) && contains_music(dir, extensions, follow_links))
        .collect()
}

fn log_walk_error(root: &Path, err: &walkdir::Error) {
    let path = err.path().unwrap_or(root).to_path_buf();
    if err.io_error().map(|io| io.kind()) == Some(io::ErrorKind::PermissionDenied) {
        debug!(path = %path.display(), "permission denied, skipping subtree");
        return;
    }
    let err = Error::Discovery {
        path,
        reason: err.to_string(),
    };
    warn!(error = %err, "discovery walk error");
}

fn contains_music(dir: &Path, extensions: &[String], follow_links: bool) -> bool {
    WalkDir::new(dir)
        .follow_links(follow_links)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_entry(|e| !is_hidden(e.path()))
        .filter_map(|e| e.ok())
        .any(|e| e.file_type().is_file() && is_audio_file(e.path(), extensions))
}
