//! Audio backend capability
//!
//! The daemon never decodes or mixes audio itself; it consumes a narrow
//! capability that turns a track path into a playable stream. The production
//! implementation binds rodio; tests substitute a scripted double.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::source::Source;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::error::{Error, Result};

/// Reported activity state of a loaded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Not producing audio: never started, finished, or explicitly stopped
    Stopped,
    /// Actively producing audio
    Playing,
    /// Started but starved of data (not every backend reports this)
    Stalled,
    /// Suspended, resumable
    Paused,
}

/// Opaque audio backend: turns a track path into a playable stream.
///
/// Initialization is the concrete type's constructor; an init failure is
/// fatal at startup.
pub trait AudioEngine: Send + Sync {
    /// Open and prepare a track for playback. The returned stream is loaded
    /// but not started.
    fn load(&self, path: &Path) -> Result<Box<dyn EngineStream>>;
}

/// A loaded, playable stream bound to the backend.
///
/// Dropping the value releases the backend resources; callers keep at most
/// one stream alive at a time.
pub trait EngineStream: Send {
    /// Begin or restart playback.
    fn start(&mut self) -> Result<()>;

    /// Suspend playback, resumable via `start`.
    fn pause(&mut self);

    /// Halt playback. The stream stays loaded but reports `Stopped`.
    fn stop(&mut self);

    /// Point-in-time activity state.
    fn state(&self) -> ChannelState;

    /// Elapsed playback time in seconds.
    fn position_secs(&self) -> f64;

    /// Seek to an absolute position. Out-of-range targets are resolved by
    /// the backend (clamp, reject, or no-op).
    fn seek_secs(&mut self, seconds: f64) -> Result<()>;

    /// Total track length in seconds, 0.0 when the backend cannot tell.
    fn length_secs(&self) -> f64;

    /// Current stream volume as reported by the backend.
    fn volume(&self) -> f32;

    /// Apply a volume to this stream.
    fn set_volume(&mut self, volume: f32);
}

/// rodio-backed engine.
///
/// The output stream is not `Send`, so it lives on a dedicated thread for
/// the lifetime of the process; only the handle crosses threads. Each loaded
/// track gets its own `Sink`.
pub struct RodioEngine {
    handle: OutputStreamHandle,
}

impl RodioEngine {
    /// Open the default audio device.
    ///
    /// Blocks until the output stream is up (or failed) on the audio thread.
    pub fn init() -> Result<Self> {
        let (init_tx, init_rx) = std::sync::mpsc::channel();

        std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    if init_tx.send(Ok(handle)).is_err() {
                        return;
                    }
                    // The stream must outlive every sink attached to it.
                    let _stream = stream;
                    loop {
                        std::thread::park();
                    }
                }
                Err(e) => {
                    let _ = init_tx.send(Err(Error::EngineInit(e.to_string())));
                }
            })
            .map_err(|e| Error::EngineInit(format!("failed to spawn audio thread: {}", e)))?;

        init_rx
            .recv()
            .map_err(|_| Error::EngineInit("audio thread terminated during init".to_string()))?
            .map(|handle| Self { handle })
    }
}

impl AudioEngine for RodioEngine {
    fn load(&self, path: &Path) -> Result<Box<dyn EngineStream>> {
        let file =
            File::open(path).map_err(|e| Error::Load(format!("{}: {}", path.display(), e)))?;
        let decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| Error::Load(format!("{}: {}", path.display(), e)))?;
        let length = decoder.total_duration().unwrap_or(Duration::ZERO);

        let sink = Sink::try_new(&self.handle).map_err(|e| Error::Load(e.to_string()))?;
        sink.pause();
        sink.append(decoder);

        Ok(Box::new(RodioStream { sink, length }))
    }
}

struct RodioStream {
    sink: Sink,
    length: Duration,
}

impl EngineStream for RodioStream {
    fn start(&mut self) -> Result<()> {
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        self.sink.stop();
    }

    fn state(&self) -> ChannelState {
        if self.sink.empty() {
            ChannelState::Stopped
        } else if self.sink.is_paused() {
            ChannelState::Paused
        } else {
            ChannelState::Playing
        }
    }

    fn position_secs(&self) -> f64 {
        self.sink.get_pos().as_secs_f64()
    }

    fn seek_secs(&mut self, seconds: f64) -> Result<()> {
        // Negative targets clamp to the start; past-the-end is rodio's call.
        let target = Duration::from_secs_f64(seconds.max(0.0));
        self.sink
            .try_seek(target)
            .map_err(|e| Error::Seek(e.to_string()))
    }

    fn length_secs(&self) -> f64 {
        self.length.as_secs_f64()
    }

    fn volume(&self) -> f32 {
        self.sink.volume()
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }
}
