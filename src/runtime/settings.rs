use crate::config;

pub fn load_settings() -> config::Settings {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("jukebox: invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            // The settings file is optional; a broken one must not block startup.
            eprintln!("jukebox: failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}
