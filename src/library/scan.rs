use std::path::{Component, Path};

use walkdir::WalkDir;

use crate::error::{Error, Result};

use super::model::{DirectoryListing, Track};

/// Audio formats offered for browsing unless the settings say otherwise.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["mp3", "wav", "flac", "ogg", "m4a", "aac"];

pub(super) fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// `extensions` must already be normalized (lowercase, no dot).
pub(super) fn is_audio_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            extensions.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

pub(super) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// True when any component of `path` starts with a dot.
pub fn has_hidden_component(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

/// List the immediate subdirectories and audio files of `dir`.
///
/// Hidden entries are skipped. Unreadable children are skipped too; only a
/// failure to read `dir` itself is reported. Symlinks are listed only when
/// `follow_links` is set.
pub fn scan_directory(
    dir: &Path,
    extensions: &[String],
    follow_links: bool,
) -> Result<DirectoryListing> {
    let invalid = |reason: String| Error::InvalidDirectory {
        path: dir.to_path_buf(),
        reason,
    };

    if !dir.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    let extensions = normalize_extensions(extensions);

    let walker = WalkDir::new(dir)
        .follow_links(follow_links)
        .max_depth(1)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));

    let mut listing = DirectoryListing::default();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(invalid(e.to_string())),
            Err(_) => continue,
        };
        if entry.depth() == 0 {
            continue;
        }
        let file_type = entry.file_type();
        if file_type.is_dir() {
            listing.folders.push(entry.into_path());
        } else if file_type.is_file() && is_audio_file(entry.path(), &extensions) {
            listing.tracks.push(Track::from_path(entry.into_path()));
        }
    }

    listing.folders.sort();
    listing.folders.dedup();
    listing.tracks.sort_by(|a, b| a.path.cmp(&b.path));
    listing.tracks.dedup_by(|a, b| a.path == b.path);
    Ok(listing)
}
