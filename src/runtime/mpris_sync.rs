use std::path::PathBuf;

use crate::audio::{PlaybackState, SessionSnapshot};
use crate::mpris::MprisHandle;

/// The part of the snapshot last pushed over MPRIS.
#[derive(Debug, Clone, PartialEq)]
struct Published {
    state: PlaybackState,
    track: Option<usize>,
    path: Option<PathBuf>,
    length_ms: i64,
}

/// Pushes playback changes to MPRIS, whoever caused them: keys, remote
/// commands or the monitor advancing on its own.
#[derive(Debug, Default)]
pub struct MprisSync {
    last: Option<Published>,
}

impl MprisSync {
    pub fn update(&mut self, mpris: &MprisHandle, snap: &SessionSnapshot) {
        let current = Published {
            state: snap.state,
            track: snap.current_track,
            path: snap.track.as_ref().map(|t| t.path.clone()),
            length_ms: snap.length_ms,
        };
        if self.last.as_ref() == Some(&current) {
            return;
        }

        let track = match snap.state {
            PlaybackState::Stopped => None,
            _ => snap.track.as_ref(),
        };
        mpris.set_track_metadata(snap.current_track, track, snap.length_ms);
        mpris.set_playback(snap.state);
        self.last = Some(current);
    }
}
