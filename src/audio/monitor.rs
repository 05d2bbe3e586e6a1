use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{Span, debug, info, warn};

use crate::config::MonitorSettings;
use crate::error::{Error, Result};

use super::controller::PlaybackController;
use super::engine::MediaEngine;
use super::types::{PlaybackState, RepeatMode, SharedController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorTimings {
    pub poll_interval: Duration,
    pub after_event: Duration,
    pub error_backoff: Duration,
    pub stall_window: Duration,
    pub max_stalls: u32,
    pub recovery_pause: Duration,
}

impl From<&MonitorSettings> for MonitorTimings {
    fn from(s: &MonitorSettings) -> Self {
        Self {
            poll_interval: Duration::from_millis(s.poll_interval_ms),
            after_event: Duration::from_millis(s.after_event_ms),
            error_backoff: Duration::from_millis(s.error_backoff_ms),
            stall_window: Duration::from_secs(s.stall_window_secs),
            max_stalls: s.max_stalls.max(1),
            recovery_pause: Duration::from_millis(s.recovery_pause_ms),
        }
    }
}

/// What one monitor tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Replayed,
    Advanced,
    Recovered,
}

/// Watches the controller for tracks that ran out and keeps playback going
/// according to the repeat mode.
///
/// Repeated events in a short window are treated as a stall: playback is
/// forced to stop and restarted once instead of advancing again.
pub struct ContinuousMonitor<E: MediaEngine> {
    controller: SharedController<E>,
    timings: MonitorTimings,
    stall_count: u32,
    last_event: Option<Instant>,
    last_position_ms: i64,
    last_track: Option<usize>,
    span: Span,
}

impl<E: MediaEngine + 'static> ContinuousMonitor<E> {
    pub fn new(controller: SharedController<E>, timings: MonitorTimings, span: Span) -> Self {
        Self {
            controller,
            timings,
            stall_count: 0,
            last_event: None,
            last_position_ms: 0,
            last_track: None,
            span,
        }
    }

    #[cfg(test)]
    pub fn stall_count(&self) -> u32 {
        self.stall_count
    }

    /// Run the monitor on its own thread until the handle is stopped.
    pub fn spawn(self) -> io::Result<MonitorHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let join = thread::Builder::new()
            .name("playback-monitor".to_string())
            .spawn(move || self.run(&flag))?;
        Ok(MonitorHandle {
            stop,
            join: Some(join),
        })
    }

    fn run(mut self, stop: &AtomicBool) {
        let span = self.span.clone();
        let _span = span.enter();
        debug!("monitor started");
        while !stop.load(Ordering::Relaxed) {
            let delay = match self.tick(Instant::now()) {
                Ok(TickOutcome::Idle) => self.timings.poll_interval,
                Ok(outcome) => {
                    debug!(?outcome, "track transition handled");
                    self.timings.after_event
                }
                Err(e) => {
                    warn!(error = %e, "monitor tick failed");
                    self.timings.error_backoff
                }
            };
            thread::sleep(delay);
        }
        debug!("monitor stopped");
    }

    /// One poll of the controller at time `now`.
    pub fn tick(&mut self, now: Instant) -> Result<TickOutcome> {
        let controller = Arc::clone(&self.controller);
        let mut ctl = controller
            .lock()
            .map_err(|_| Error::Engine("controller lock poisoned".to_string()))?;

        let obs = ctl.observe();
        if ctl.current_index() != self.last_track {
            self.last_track = ctl.current_index();
            self.last_position_ms = 0;
        }

        match obs.state {
            PlaybackState::Stopped => {
                self.last_position_ms = 0;
                return Ok(TickOutcome::Idle);
            }
            PlaybackState::Paused => return Ok(TickOutcome::Idle),
            PlaybackState::Playing => {}
        }

        if obs.engine_playing {
            if obs.time_ms > 0 {
                self.last_position_ms = obs.time_ms;
            }
            ctl.refresh();
            return Ok(TickOutcome::Idle);
        }

        let position = if obs.time_ms > 0 {
            obs.time_ms
        } else {
            self.last_position_ms
        };
        if position <= 0 {
            return Ok(TickOutcome::Idle);
        }

        self.last_position_ms = 0;
        let stalls = self.record_event(now);
        debug!(position, stalls, "track ended");

        if stalls >= self.timings.max_stalls {
            warn!(stalls, "playback keeps stopping, restarting it");
            ctl.stop();
            thread::sleep(self.timings.recovery_pause);
            self.stall_count = 0;
            resume(&mut ctl);
            self.last_track = ctl.current_index();
            return Ok(TickOutcome::Recovered);
        }

        let outcome = resume(&mut ctl);
        self.last_track = ctl.current_index();
        Ok(outcome)
    }

    fn record_event(&mut self, now: Instant) -> u32 {
        let within = self
            .last_event
            .is_some_and(|prev| now.saturating_duration_since(prev) <= self.timings.stall_window);
        self.stall_count = if within { self.stall_count + 1 } else { 1 };
        self.last_event = Some(now);
        self.stall_count
    }
}

fn resume<E: MediaEngine>(ctl: &mut PlaybackController<E>) -> TickOutcome {
    match ctl.repeat_mode() {
        RepeatMode::Track => {
            info!("repeating track");
            ctl.replay();
            TickOutcome::Replayed
        }
        RepeatMode::Folder | RepeatMode::Off => {
            ctl.next();
            TickOutcome::Advanced
        }
    }
}

/// Stops the monitor thread when asked to, or when dropped.
pub struct MonitorHandle {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take()
            && join.join().is_err()
        {
            warn!("monitor thread panicked");
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
