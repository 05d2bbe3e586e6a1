use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{Span, debug, info, warn};

use crate::config::LibrarySettings;
use crate::error::Result;
use crate::prefs::Preferences;

use super::discover::{default_roots, discover_music_directories};
use super::model::{DirectoryListing, Track};
use super::scan::{has_hidden_component, scan_directory};

/// Cache of discovered music directories plus the listing of the directory
/// currently open for browsing.
///
/// With no directory open the index is in the *root view*: its folders are the
/// discovered directories and it has no tracks.
pub struct LibraryIndex {
    discovered: Vec<PathBuf>,
    current_dir: Option<PathBuf>,
    listing: DirectoryListing,
    extensions: Vec<String>,
    roots: Vec<PathBuf>,
    follow_links: bool,
    span: Span,
}

impl LibraryIndex {
    pub fn new(settings: &LibrarySettings, span: Span) -> Self {
        let roots = if settings.discovery_roots.is_empty() {
            default_roots()
        } else {
            settings.discovery_roots.clone()
        };

        Self {
            discovered: Vec::new(),
            current_dir: None,
            listing: DirectoryListing::default(),
            extensions: settings.extensions.clone(),
            roots,
            follow_links: settings.follow_links,
            span,
        }
    }

    /// Build the index with its discovery cache seeded from `prefs`.
    pub fn from_prefs(settings: &LibrarySettings, prefs: &Preferences, span: Span) -> Self {
        let mut index = Self::new(settings, span);
        let restored = index.apply_prefs(prefs);
        index.span.in_scope(|| debug!(restored, "discovery cache restored"));
        index
    }

    /// The discovery cache, sorted.
    pub fn discovered(&self) -> &[PathBuf] {
        &self.discovered
    }

    pub fn current_directory(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    #[cfg(test)]
    pub fn is_root_view(&self) -> bool {
        self.current_dir.is_none()
    }

    /// Folders of the current scope.
    pub fn folders(&self) -> &[PathBuf] {
        match self.current_dir {
            None => &self.discovered,
            Some(_) => &self.listing.folders,
        }
    }

    /// Tracks of the current scope. Always empty in the root view.
    pub fn tracks(&self) -> &[Track] {
        match self.current_dir {
            None => &[],
            Some(_) => &self.listing.tracks,
        }
    }

    pub fn is_discovered(&self, dir: &Path) -> bool {
        self.discovered
            .binary_search_by(|p| p.as_path().cmp(dir))
            .is_ok()
    }

    pub fn scan_directory(&self, path: &Path) -> Result<DirectoryListing> {
        scan_directory(path, &self.extensions, self.follow_links)
    }

    /// Make `dir` the current directory. On failure nothing changes.
    pub fn open(&mut self, dir: &Path) -> Result<()> {
        let _span = self.span.enter();
        match self.scan_directory(dir) {
            Ok(listing) => {
                info!(
                    dir = %dir.display(),
                    folders = listing.folders.len(),
                    tracks = listing.tracks.len(),
                    "directory opened"
                );
                self.current_dir = Some(dir.to_path_buf());
                self.listing = listing;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "cannot open directory");
                Err(e)
            }
        }
    }

    /// Return to the root view.
    pub fn close(&mut self) {
        self.current_dir = None;
        self.listing = DirectoryListing::default();
    }

    pub fn discover_music_directories(&self) -> Vec<PathBuf> {
        let _span = self.span.enter();
        discover_music_directories(&self.roots, &self.extensions, self.follow_links)
    }

    /// Add the directories not cached yet and return how many were added.
    pub fn merge_discovered<I>(&mut self, dirs: I) -> usize
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut set: BTreeSet<PathBuf> = self.discovered.drain(..).collect();
        let before = set.len();
        for dir in dirs {
            if has_hidden_component(&dir) {
                debug!(dir = %dir.display(), "refusing hidden directory");
                continue;
            }
            set.insert(dir);
        }
        let added = set.len() - before;
        self.discovered = set.into_iter().collect();
        added
    }

    /// Run discovery and merge the result into the cache.
    pub fn rescan(&mut self) -> usize {
        let found = self.discover_music_directories();
        let scanned = found.len();
        let added = self.merge_discovered(found);
        let _span = self.span.enter();
        info!(scanned, added, total = self.discovered.len(), "rescan merged");
        added
    }

    /// Seed the discovery cache from stored preferences.
    pub fn apply_prefs(&mut self, prefs: &Preferences) -> usize {
        self.merge_discovered(prefs.found_music_dirs.iter().cloned())
    }

    /// Copy the persisted parts of the index into `prefs`.
    pub fn write_prefs(&self, prefs: &mut Preferences) {
        prefs.found_music_dirs = self.discovered.clone();
        prefs.last_directory = self.current_dir.clone();
    }
}
