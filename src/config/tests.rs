use super::load::resolve_config_path;
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_jukebox_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("JUKEBOX_CONFIG_PATH", "/tmp/jukebox-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/jukebox-test-config.toml")
    );
}

#[test]
fn resolve_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g0 = EnvGuard::remove("JUKEBOX_CONFIG_PATH");
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("jukebox")
            .join("config.toml")
    );
}

#[test]
fn resolve_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g0 = EnvGuard::remove("JUKEBOX_CONFIG_PATH");
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("jukebox")
            .join("config.toml")
    );
}

#[test]
fn defaults_match_documented_timings() {
    let s = Settings::default();
    assert_eq!(s.playback.seek_seconds, 10);
    assert_eq!(s.playback.volume_step, 10);
    assert_eq!(s.playback.play_settle_ms, 500);
    assert_eq!(s.monitor.poll_interval_ms, 100);
    assert_eq!(s.monitor.stall_window_secs, 5);
    assert_eq!(s.monitor.max_stalls, 3);
    assert_eq!(s.ui.tick_ms, 20);
    assert_eq!(s.ui.seek_repeat_ms, 600);
    assert_eq!(
        s.library.extensions,
        vec!["mp3", "wav", "flac", "ogg", "m4a", "aac"]
    );
    assert!(s.validate().is_ok());
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
seek_seconds = 5
volume_step = 20

[monitor]
poll_interval_ms = 250
max_stalls = 4

[engine]
file_caching_ms = 3000

[library]
extensions = ["mp3"]
follow_links = true
discovery_roots = ["/srv/music"]

[ui]
header_text = "hello"

[mpris]
enabled = false
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("JUKEBOX_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("JUKEBOX__PLAYBACK__SEEK_SECONDS");

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.seek_seconds, 5);
    assert_eq!(s.playback.volume_step, 20);
    // Untouched keys keep their defaults.
    assert_eq!(s.playback.play_settle_ms, 500);
    assert_eq!(s.monitor.poll_interval_ms, 250);
    assert_eq!(s.monitor.max_stalls, 4);
    assert_eq!(s.engine.file_caching_ms, 3000);
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(s.library.follow_links);
    assert_eq!(
        s.library.discovery_roots,
        vec![std::path::PathBuf::from("/srv/music")]
    );
    assert_eq!(s.ui.header_text, "hello");
    assert!(!s.mpris.enabled);
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
seek_seconds = 30
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("JUKEBOX_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("JUKEBOX__PLAYBACK__SEEK_SECONDS", "15");

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.seek_seconds, 15);
}

#[test]
fn validate_rejects_zero_stall_threshold_and_empty_extensions() {
    let mut s = Settings::default();
    s.monitor.max_stalls = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.library.extensions = vec![" ".to_string(), ".".to_string()];
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.volume_step = 0;
    assert!(s.validate().is_err());
}

#[test]
fn validate_bounds_seek_step() {
    let mut s = Settings::default();
    s.playback.seek_seconds = 3600;
    assert!(s.validate().is_ok());

    s.playback.seek_seconds = u64::MAX;
    assert!(s.validate().is_err());

    s.playback.seek_seconds = 0;
    assert!(s.validate().is_err());
}
