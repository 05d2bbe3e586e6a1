//! [`MediaEngine`] on top of `rodio`.
//!
//! The output stream lives on its own thread for the lifetime of the engine;
//! the engine only keeps the stream's mixer and connects one sink per track.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use lofty::prelude::*;
use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStreamBuilder, Sink};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::engine::{MediaEngine, MediaOptions};

/// Read-ahead per millisecond of requested caching, sized for ~384 kbit/s.
const BYTES_PER_CACHED_MS: usize = 48;
const MIN_READ_BUFFER: usize = 8 * 1024;

/// A track prepared for playback: where it is and what we know about it.
#[derive(Debug, Clone)]
pub struct RodioMedia {
    path: PathBuf,
    byte_len: u64,
    buffer_size: usize,
    length_ms: i64,
}

pub struct RodioEngine {
    mixer: Option<Mixer>,
    sink: Option<Sink>,
    length_ms: i64,
    volume: f32,
    shutdown: Option<Sender<()>>,
    output: Option<JoinHandle<()>>,
}

impl RodioEngine {
    /// Open the default output device.
    pub fn open() -> Result<Self> {
        let (ready_tx, ready_rx) = mpsc::channel::<std::result::Result<Mixer, String>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let output = thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let mut stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                // rodio logs to stderr when the stream is dropped, which
                // would scribble over the TUI.
                stream.log_on_drop(false);
                if ready_tx.send(Ok(stream.mixer().clone())).is_err() {
                    return;
                }
                // Keep the stream alive until release() or the engine is dropped.
                let _ = shutdown_rx.recv();
            })
            .map_err(|e| Error::Engine(format!("cannot spawn audio thread: {e}")))?;

        let mixer = match ready_rx.recv() {
            Ok(Ok(mixer)) => mixer,
            Ok(Err(reason)) => {
                let _ = output.join();
                return Err(Error::Engine(format!("no audio output device: {reason}")));
            }
            Err(_) => {
                let _ = output.join();
                return Err(Error::Engine("audio thread exited early".to_string()));
            }
        };
        info!("audio output opened");

        Ok(Self {
            mixer: Some(mixer),
            sink: None,
            length_ms: -1,
            volume: 0.5,
            shutdown: Some(shutdown_tx),
            output: Some(output),
        })
    }

    fn mixer(&self) -> Result<&Mixer> {
        self.mixer
            .as_ref()
            .ok_or_else(|| Error::Engine("engine already released".to_string()))
    }
}

impl MediaEngine for RodioEngine {
    type Media = RodioMedia;

    fn new_media(&mut self, path: &Path, options: &MediaOptions) -> Result<RodioMedia> {
        let byte_len = std::fs::metadata(path)
            .map_err(|e| Error::Engine(e.to_string()))?
            .len();
        let length_ms = probe_length_ms(path);
        // rodio has no knobs for stretching or resampling; the hints are kept
        // for the log only.
        debug!(path = %path.display(), hints = ?options.option_strings(), length_ms, "media created");

        Ok(RodioMedia {
            path: path.to_path_buf(),
            byte_len,
            buffer_size: (options.file_caching_ms as usize * BYTES_PER_CACHED_MS)
                .max(MIN_READ_BUFFER),
            length_ms,
        })
    }

    fn set_media(&mut self, media: &RodioMedia) -> Result<()> {
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        let source = decode(media)?;
        let sink = Sink::connect_new(self.mixer()?);
        sink.set_volume(self.volume);
        sink.append(source);
        sink.pause();
        self.sink = Some(sink);
        self.length_ms = media.length_ms;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let sink = self
            .sink
            .as_ref()
            .ok_or_else(|| Error::Engine("no media loaded".to_string()))?;
        sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|s| !s.is_paused() && !s.empty())
    }

    fn time_ms(&self) -> i64 {
        self.sink
            .as_ref()
            .map(|s| s.get_pos().as_millis() as i64)
            .unwrap_or(-1)
    }

    fn set_time_ms(&mut self, ms: i64) -> Result<()> {
        let sink = self
            .sink
            .as_ref()
            .ok_or_else(|| Error::Engine("no media loaded".to_string()))?;
        sink.try_seek(Duration::from_millis(ms.max(0) as u64))
            .map_err(|e| Error::Engine(format!("seek: {e}")))
    }

    fn length_ms(&self) -> i64 {
        if self.sink.is_some() { self.length_ms } else { -1 }
    }

    fn set_volume(&mut self, volume: u8) {
        self.volume = f32::from(volume.min(100)) / 100.0;
        if let Some(sink) = self.sink.as_ref() {
            sink.set_volume(self.volume);
        }
    }

    fn release(&mut self) {
        self.stop();
        self.mixer = None;
        // Dropping the sender wakes the output thread as well.
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(output) = self.output.take()
            && output.join().is_err()
        {
            warn!("audio output thread panicked");
        }
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.release();
    }
}

fn decode(media: &RodioMedia) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(&media.path).map_err(|e| Error::Engine(e.to_string()))?;
    let mut builder = Decoder::builder()
        .with_data(BufReader::with_capacity(media.buffer_size, file))
        .with_byte_len(media.byte_len)
        .with_seekable(true);
    if let Some(ext) = media.path.extension().and_then(|e| e.to_str()) {
        builder = builder.with_hint(&ext.to_ascii_lowercase());
    }
    builder
        .build()
        .map_err(|e| Error::Engine(format!("decode: {e}")))
}

fn probe_length_ms(path: &Path) -> i64 {
    match lofty::read_from_path(path) {
        Ok(tagged) => tagged.properties().duration().as_millis() as i64,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no length metadata");
            -1
        }
    }
}
