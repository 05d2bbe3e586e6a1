//! Playback: the session state machine, the engine it drives and the monitor
//! that keeps playback going across tracks.

mod controller;
mod engine;
#[cfg(test)]
pub(crate) mod mock;
mod monitor;
mod rodio_engine;
mod types;

pub use controller::{PlaybackController, PlaybackTimings, clamp_volume};
pub use engine::{MediaEngine, MediaOptions};
pub use monitor::{ContinuousMonitor, MonitorHandle, MonitorTimings, TickOutcome};
pub use rodio_engine::{RodioEngine, RodioMedia};
pub use types::{
    Observation, PlaybackState, RepeatMode, SessionSnapshot, SharedController, SnapshotHandle,
    TransientMessage, UnknownRepeatMode,
};
