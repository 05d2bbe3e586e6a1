use std::path::PathBuf;

use super::display::display_name;

/// A playable file. Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub path: PathBuf,
    pub display: String,
}

impl Track {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display = display_name(&path);
        Self { path, display }
    }
}

/// Immediate children of one directory, both sorted ascending by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub folders: Vec<PathBuf>,
    pub tracks: Vec<Track>,
}
