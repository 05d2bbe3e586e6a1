//! Remote control over D-Bus (MPRIS), so media keys and `playerctl` work.
//!
//! The service runs on its own thread and only forwards commands; the
//! foreground loop drains them and publishes what is playing back here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc::Sender};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, warn};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::audio::PlaybackState;
use crate::library::Track;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.jukebox";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackState,
    title: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<String>,
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
}

impl MprisHandle {
    /// A handle with no service behind it.
    pub fn detached() -> Self {
        Self {
            state: Arc::new(Mutex::new(SharedState::default())),
        }
    }

    pub fn set_playback(&self, playback: PlaybackState) {
        if let Ok(mut s) = self.state.lock() {
            s.playback = playback;
        }
    }

    /// Publish the playing track. `length_ms` below zero means unknown.
    pub fn set_track_metadata(&self, index: Option<usize>, track: Option<&Track>, length_ms: i64) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        match (index, track) {
            (Some(i), Some(t)) => {
                s.title = Some(t.display.clone());
                s.url = Some(format!("file://{}", t.path.display()));
                s.length_micros = (length_ms >= 0).then(|| length_ms * 1000);
                s.track_id = Some(format!("{OBJECT_PATH}/track/{i}"));
            }
            _ => {
                s.title = None;
                s.url = None;
                s.length_micros = None;
                s.track_id = None;
            }
        }
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {}

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "jukebox"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        s.playback.label()
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let Ok(s) = self.state.lock() else {
            return HashMap::new();
        };
        metadata_map(&s)
    }
}

fn metadata_map(s: &SharedState) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();
    let mut put = |key: &str, value: Value<'_>| {
        if let Ok(v) = OwnedValue::try_from(value) {
            map.insert(key.to_string(), v);
        }
    };

    if let Some(id) = s.track_id.as_deref()
        && let Ok(path) = ObjectPath::try_from(id)
    {
        put("mpris:trackid", Value::from(path));
    }
    put("xesam:title", Value::from(s.title.clone().unwrap_or_default()));
    if let Some(url) = s.url.as_deref() {
        put("xesam:url", Value::from(url.to_string()));
    }
    if let Some(len) = s.length_micros {
        put("mpris:length", Value::from(len));
    }
    map
}

/// Register the service on the session bus. Failures are logged and leave a
/// working handle with no service behind it.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let handle = MprisHandle::detached();
    let state = Arc::clone(&handle.state);

    let spawned = std::thread::Builder::new()
        .name("mpris".to_string())
        .spawn(move || {
            block_on(async move {
                let connection = match Connection::session().await {
                    Ok(c) => c,
                    Err(e) => {
                        warn!(error = %e, "MPRIS: no session bus");
                        return;
                    }
                };

                if let Err(e) = connection.request_name(BUS_NAME).await {
                    warn!(error = %e, "MPRIS: failed to acquire name");
                    return;
                }

                let object_server = connection.object_server();
                if let Err(e) = object_server
                    .at(OBJECT_PATH, RootIface { tx: tx.clone() })
                    .await
                {
                    warn!(error = %e, "MPRIS: failed to register root iface");
                    return;
                }
                if let Err(e) = object_server
                    .at(OBJECT_PATH, PlayerIface { tx, state })
                    .await
                {
                    warn!(error = %e, "MPRIS: failed to register player iface");
                    return;
                }
                debug!("MPRIS service registered");

                // Keep the connection alive.
                loop {
                    Timer::after(Duration::from_secs(3600)).await;
                }
            });
        });

    if let Err(e) = spawned {
        warn!(error = %e, "MPRIS: cannot spawn thread");
    }
    handle
}
