//! Scripted audio backend double
//!
//! Streams are in-memory state machines the test can inspect and drive:
//! fail a load, fail a start, or finish the current track to exercise the
//! completion-detection path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use phonod::engine::{AudioEngine, ChannelState, EngineStream};
use phonod::error::{Error, Result};

/// Scripted behavior for one track.
#[derive(Debug, Clone)]
pub struct TrackSpec {
    pub length_secs: f64,
    pub fail_load: bool,
    pub fail_start: bool,
}

impl Default for TrackSpec {
    fn default() -> Self {
        Self {
            length_secs: 180.0,
            fail_load: false,
            fail_start: false,
        }
    }
}

/// Mutable state of one scripted stream.
#[derive(Debug)]
pub struct StreamState {
    pub channel: ChannelState,
    pub volume: f32,
    pub position: f64,
    pub length: f64,
    pub fail_start: bool,
}

pub struct ScriptedEngine {
    tracks: Mutex<HashMap<PathBuf, TrackSpec>>,
    current: Mutex<Option<Arc<Mutex<StreamState>>>>,
    live: Arc<AtomicUsize>,
    max_live: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tracks: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            live: Arc::new(AtomicUsize::new(0)),
            max_live: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Script the behavior of one track; unscripted tracks load fine.
    pub fn script(&self, path: impl Into<PathBuf>, spec: TrackSpec) {
        self.tracks.lock().unwrap().insert(path.into(), spec);
    }

    /// State of the most recently loaded stream.
    pub fn current(&self) -> Option<Arc<Mutex<StreamState>>> {
        self.current.lock().unwrap().clone()
    }

    /// Simulate the current track reaching its natural end.
    pub fn finish_current(&self) {
        if let Some(state) = self.current() {
            state.lock().unwrap().channel = ChannelState::Stopped;
        }
    }

    pub fn live_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// High-water mark of concurrently live streams.
    pub fn max_live_streams(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

impl AudioEngine for ScriptedEngine {
    fn load(&self, path: &Path) -> Result<Box<dyn EngineStream>> {
        let spec = self
            .tracks
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default();
        if spec.fail_load {
            return Err(Error::Load(format!(
                "scripted load failure: {}",
                path.display()
            )));
        }

        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);

        let state = Arc::new(Mutex::new(StreamState {
            channel: ChannelState::Stopped,
            volume: 1.0,
            position: 0.0,
            length: spec.length_secs,
            fail_start: spec.fail_start,
        }));
        *self.current.lock().unwrap() = Some(Arc::clone(&state));

        Ok(Box::new(ScriptedStream {
            state,
            live: Arc::clone(&self.live),
        }))
    }
}

struct ScriptedStream {
    state: Arc<Mutex<StreamState>>,
    live: Arc<AtomicUsize>,
}

impl EngineStream for ScriptedStream {
    fn start(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_start {
            return Err(Error::Start("scripted start failure".to_string()));
        }
        state.channel = ChannelState::Playing;
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.state.lock().unwrap();
        if state.channel == ChannelState::Playing {
            state.channel = ChannelState::Paused;
        }
    }

    fn stop(&mut self) {
        self.state.lock().unwrap().channel = ChannelState::Stopped;
    }

    fn state(&self) -> ChannelState {
        self.state.lock().unwrap().channel
    }

    fn position_secs(&self) -> f64 {
        self.state.lock().unwrap().position
    }

    fn seek_secs(&mut self, seconds: f64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let max = if state.length > 0.0 {
            state.length
        } else {
            f64::MAX
        };
        state.position = seconds.clamp(0.0, max);
        Ok(())
    }

    fn length_secs(&self) -> f64 {
        self.state.lock().unwrap().length
    }

    fn volume(&self) -> f32 {
        self.state.lock().unwrap().volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.lock().unwrap().volume = volume;
    }
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
