use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::library::{LibraryIndex, Track};

/// Rows per page.
pub const PAGE_SIZE: usize = 10;

/// One row of the combined list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<'a> {
    Folder(&'a Path),
    Track(&'a Track),
}

/// Cursor over `[folders..., tracks...]` of the library's current scope.
///
/// `selected` is always a valid row (or 0 when the list is empty) and `page`
/// is always `selected / PAGE_SIZE`.
pub struct NavigationState {
    library: LibraryIndex,
    selected: usize,
    page: usize,
}

impl NavigationState {
    pub fn new(library: LibraryIndex) -> Self {
        Self {
            library,
            selected: 0,
            page: 0,
        }
    }

    pub fn library(&self) -> &LibraryIndex {
        &self.library
    }

    pub fn current_directory(&self) -> Option<&Path> {
        self.library.current_directory()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn folder_count(&self) -> usize {
        self.library.folders().len()
    }

    pub fn total(&self) -> usize {
        self.library.folders().len() + self.library.tracks().len()
    }

    pub fn page_count(&self) -> usize {
        self.total().div_ceil(PAGE_SIZE).max(1)
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.select(self.selected - 1);
        }
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.total() {
            self.select(self.selected + 1);
        }
    }

    pub fn entry(&self, row: usize) -> Option<Entry<'_>> {
        let folders = self.library.folders();
        if let Some(dir) = folders.get(row) {
            return Some(Entry::Folder(dir));
        }
        self.library
            .tracks()
            .get(row - folders.len())
            .map(Entry::Track)
    }

    pub fn selected_entry(&self) -> Option<Entry<'_>> {
        self.entry(self.selected)
    }

    /// Index into the current track list of the selected row, if it is a track.
    pub fn selected_track_index(&self) -> Option<usize> {
        self.selected
            .checked_sub(self.folder_count())
            .filter(|&i| i < self.library.tracks().len())
    }

    /// Move the cursor onto track `index` of the current list.
    pub fn select_track(&mut self, index: usize) {
        if index < self.library.tracks().len() {
            self.select(self.folder_count() + index);
        }
    }

    /// Rows of the current page, with their absolute row numbers.
    pub fn visible(&self) -> Vec<(usize, Entry<'_>)> {
        let start = self.page * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(self.total());
        (start..end)
            .filter_map(|row| self.entry(row).map(|e| (row, e)))
            .collect()
    }

    /// Open the selected folder. Returns `Ok(false)` when the selection is
    /// not a folder.
    pub fn enter(&mut self) -> Result<bool> {
        let Some(Entry::Folder(dir)) = self.selected_entry() else {
            return Ok(false);
        };
        let dir = dir.to_path_buf();
        self.open(&dir)?;
        Ok(true)
    }

    /// Go up one level.
    ///
    /// A discovered directory goes back to the root view, any other directory
    /// to its parent. If the parent cannot be opened the root view is shown.
    pub fn back(&mut self) {
        let Some(dir) = self.library.current_directory().map(Path::to_path_buf) else {
            return;
        };
        if self.library.is_discovered(&dir) {
            self.show_root();
            return;
        }
        match dir.parent() {
            Some(parent) if self.open(parent).is_ok() => {}
            _ => {
                debug!(dir = %dir.display(), "no usable parent, showing root view");
                self.show_root();
            }
        }
    }

    pub fn open(&mut self, dir: &Path) -> Result<()> {
        self.library.open(dir)?;
        self.reset();
        Ok(())
    }

    pub fn show_root(&mut self) {
        self.library.close();
        self.reset();
    }

    /// Run discovery and merge the results. Returns how many directories
    /// were added.
    pub fn rescan(&mut self) -> usize {
        let added = self.library.rescan();
        self.clamp();
        added
    }

    /// Paths of the folders in the current scope.
    pub fn folders(&self) -> &[PathBuf] {
        self.library.folders()
    }

    pub fn tracks(&self) -> &[Track] {
        self.library.tracks()
    }

    fn select(&mut self, row: usize) {
        self.selected = row;
        self.page = row / PAGE_SIZE;
    }

    fn reset(&mut self) {
        self.select(0);
    }

    fn clamp(&mut self) {
        let total = self.total();
        self.select(self.selected.min(total.saturating_sub(1)));
    }
}
