use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::Span;

use super::*;
use crate::config::LibrarySettings;
use crate::error::Error;
use crate::prefs::Preferences;

// tempfile's default prefix is ".tmp", which discovery treats as hidden.
fn temp_root() -> TempDir {
    tempfile::Builder::new()
        .prefix("jukebox-lib")
        .tempdir()
        .expect("tempdir")
}

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, b"not really audio").expect("write");
}

fn extensions() -> Vec<String> {
    SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn index_for(root: &Path) -> LibraryIndex {
    let settings = LibrarySettings {
        discovery_roots: vec![root.to_path_buf()],
        ..LibrarySettings::default()
    };
    LibraryIndex::new(&settings, Span::none())
}

#[test]
fn display_name_replaces_punctuation_with_spaces() {
    assert_eq!(
        display_name(Path::new("/m/Artist (Live)!.mp3")),
        "Artist  Live  .mp3"
    );
    assert_eq!(display_name(Path::new("/m/a_b-c.d.ogg")), "a_b-c.d.ogg");
}

#[test]
fn display_name_truncates_long_names() {
    let name = format!("{}.flac", "x".repeat(50));
    let shown = display_name(&PathBuf::from("/m").join(name));
    assert_eq!(shown, format!("{}...", "x".repeat(40)));

    let exact = "y".repeat(36) + ".mp3";
    assert_eq!(display_name(&PathBuf::from("/m").join(&exact)), exact);
}

#[test]
fn folder_name_is_last_component() {
    assert_eq!(folder_name(Path::new("/home/me/Music")), "Music");
    assert_eq!(folder_name(Path::new("/")), "/");
}

#[test]
fn scan_directory_sorts_and_filters() {
    let root = temp_root();
    let dir = root.path();
    touch(&dir.join("b.MP3"));
    touch(&dir.join("a.flac"));
    touch(&dir.join("notes.txt"));
    touch(&dir.join(".hidden.mp3"));
    touch(&dir.join("zeta/x.ogg"));
    touch(&dir.join("alpha/y.wav"));
    fs::create_dir_all(dir.join(".git")).expect("mkdir");

    let listing = scan_directory(dir, &extensions(), false).expect("scan");

    assert_eq!(listing.folders, vec![dir.join("alpha"), dir.join("zeta")]);
    let names: Vec<&str> = listing.tracks.iter().map(|t| t.display.as_str()).collect();
    assert_eq!(names, vec!["a.flac", "b.MP3"]);
}

#[test]
fn scan_directory_honours_configured_extensions() {
    let root = temp_root();
    touch(&root.path().join("a.mp3"));
    touch(&root.path().join("b.opus"));

    let listing = scan_directory(root.path(), &[".OPUS".to_string()], false).expect("scan");
    assert_eq!(listing.tracks.len(), 1);
    assert_eq!(listing.tracks[0].path, root.path().join("b.opus"));
}

#[test]
fn scan_directory_rejects_missing_and_non_directories() {
    let root = temp_root();
    let file = root.path().join("a.mp3");
    touch(&file);

    let missing = scan_directory(&root.path().join("nope"), &extensions(), false);
    assert!(matches!(missing, Err(Error::InvalidDirectory { .. })));

    let not_dir = scan_directory(&file, &extensions(), false);
    assert!(matches!(not_dir, Err(Error::InvalidDirectory { .. })));
}

#[cfg(unix)]
#[test]
fn scan_directory_lists_symlinks_only_when_following_links() {
    let root = temp_root();
    let real = root.path().join("real");
    touch(&real.join("a.mp3"));
    let view = root.path().join("view");
    fs::create_dir_all(&view).expect("mkdir");
    std::os::unix::fs::symlink(&real, view.join("linked")).expect("symlink");
    std::os::unix::fs::symlink(real.join("a.mp3"), view.join("b.mp3")).expect("symlink");

    let plain = scan_directory(&view, &extensions(), false).expect("scan");
    assert!(plain.folders.is_empty());
    assert!(plain.tracks.is_empty());

    let followed = scan_directory(&view, &extensions(), true).expect("scan");
    assert_eq!(followed.folders, vec![view.join("linked")]);
    assert_eq!(followed.tracks.len(), 1);
    assert_eq!(followed.tracks[0].path, view.join("b.mp3"));
}

#[test]
fn discovery_candidates_are_checked_again() {
    let root = temp_root();
    let kept = root.path().join("kept");
    let emptied = root.path().join("emptied");
    let only_hidden = root.path().join("only-hidden");
    touch(&kept.join("a.mp3"));
    touch(&emptied.join("b.mp3"));
    touch(&only_hidden.join(".c.mp3"));
    fs::remove_file(emptied.join("b.mp3")).expect("rm");

    let candidates = vec![
        emptied.clone(),
        kept.clone(),
        only_hidden,
        root.path().join("gone"),
    ];
    let verified = discover::verify_candidates(candidates, &extensions(), false);
    assert_eq!(verified, vec![kept]);
}

#[test]
fn hidden_components_are_detected() {
    assert!(has_hidden_component(Path::new("/home/u/.cache/music")));
    assert!(!has_hidden_component(Path::new("/home/u/Music/Albums")));
    assert!(!has_hidden_component(Path::new("../Music")));
}

#[test]
fn discovery_finds_directories_with_music_and_skips_hidden_ones() {
    let root = temp_root();
    let base = root.path();
    touch(&base.join("Music/rock/a.mp3"));
    touch(&base.join("Music/rock/b.mp3"));
    touch(&base.join("Music/jazz/live/c.flac"));
    touch(&base.join("Documents/readme.txt"));
    touch(&base.join(".cache/music/a.mp3"));
    touch(&base.join("Music/.stash/d.mp3"));

    let found = discover_music_directories(&[base.to_path_buf()], &extensions(), false);

    assert_eq!(
        found,
        vec![base.join("Music/jazz/live"), base.join("Music/rock")]
    );
    assert!(found.iter().all(|d| !has_hidden_component(d)));
}

#[test]
fn discovery_deduplicates_overlapping_roots() {
    let root = temp_root();
    let base = root.path();
    touch(&base.join("Music/a.mp3"));

    let roots = vec![base.to_path_buf(), base.join("Music")];
    let found = discover_music_directories(&roots, &extensions(), false);
    assert_eq!(found, vec![base.join("Music")]);
}

#[test]
fn discovery_ignores_missing_roots() {
    let root = temp_root();
    let found = discover_music_directories(&[root.path().join("gone")], &extensions(), false);
    assert!(found.is_empty());
}

#[test]
fn index_root_view_lists_discovered_directories() {
    let root = temp_root();
    let base = root.path();
    touch(&base.join("b/x.mp3"));
    touch(&base.join("a/y.mp3"));

    let mut index = index_for(base);
    assert!(index.is_root_view());
    assert_eq!(index.rescan(), 2);

    assert_eq!(index.folders(), &[base.join("a"), base.join("b")]);
    assert!(index.tracks().is_empty());
    assert!(index.is_discovered(&base.join("a")));
    assert!(!index.is_discovered(base));
}

#[test]
fn index_rescan_reports_only_new_directories() {
    let root = temp_root();
    let base = root.path();
    touch(&base.join("a/y.mp3"));

    let mut index = index_for(base);
    assert_eq!(index.rescan(), 1);
    assert_eq!(index.rescan(), 0);

    touch(&base.join("c/z.ogg"));
    assert_eq!(index.rescan(), 1);
    assert_eq!(index.discovered().len(), 2);
}

#[test]
fn index_merge_refuses_hidden_paths() {
    let root = temp_root();
    let mut index = index_for(root.path());

    let added = index.merge_discovered(vec![
        PathBuf::from("/m/b"),
        PathBuf::from("/m/.secret"),
        PathBuf::from("/m/a"),
        PathBuf::from("/m/b"),
    ]);

    assert_eq!(added, 2);
    assert_eq!(index.discovered(), &[PathBuf::from("/m/a"), PathBuf::from("/m/b")]);
}

#[test]
fn index_open_and_close() {
    let root = temp_root();
    let base = root.path();
    touch(&base.join("album/one.mp3"));
    touch(&base.join("album/disc2/two.mp3"));

    let mut index = index_for(base);
    index.open(&base.join("album")).expect("open");
    assert_eq!(index.current_directory(), Some(base.join("album").as_path()));
    assert_eq!(index.folders(), &[base.join("album/disc2")]);
    assert_eq!(index.tracks().len(), 1);

    assert!(index.open(&base.join("missing")).is_err());
    assert_eq!(index.current_directory(), Some(base.join("album").as_path()));

    index.close();
    assert!(index.is_root_view());
    assert!(index.tracks().is_empty());
}

#[test]
fn index_round_trips_through_preferences() {
    let root = temp_root();
    let base = root.path();
    touch(&base.join("album/one.mp3"));

    let mut index = index_for(base);
    index.rescan();
    index.open(&base.join("album")).expect("open");

    let mut prefs = Preferences::default();
    index.write_prefs(&mut prefs);
    assert_eq!(prefs.found_music_dirs, vec![base.join("album")]);
    assert_eq!(prefs.last_directory, Some(base.join("album")));

    let mut restored = index_for(base);
    assert_eq!(restored.apply_prefs(&prefs), 1);
    assert_eq!(restored.discovered(), index.discovered());
}
