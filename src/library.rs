//! Music library: directory listings, filesystem-wide discovery of music
//! directories and the index that caches both.

mod discover;
mod display;
mod index;
mod model;
mod scan;

pub use discover::{default_roots, discover_music_directories};
pub use display::{display_name, folder_name};
pub use index::LibraryIndex;
pub use model::{DirectoryListing, Track};
pub use scan::{SUPPORTED_EXTENSIONS, has_hidden_component, scan_directory};

#[cfg(test)]
mod tests;
