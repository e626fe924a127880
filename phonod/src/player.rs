//! Playback state machine
//!
//! Owns the playlist and the currently loaded track session, and exposes the
//! transport operations the command protocol is built on. Not internally
//! synchronized: callers share a `Player` behind one lock so that client
//! commands and the idle poll never interleave on the engine stream.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::{AudioEngine, ChannelState, EngineStream};
use crate::error::{Error, Result};
use crate::playlist::Playlist;

/// Volume values outside this range are rejected, not clamped.
pub const VOLUME_RANGE: std::ops::RangeInclusive<f32> = 0.0..=1.5;

enum Direction {
    Forward,
    Backward,
}

/// Music player: playlist, current session, volume retention.
pub struct Player {
    engine: Arc<dyn AudioEngine>,
    playlist: Playlist,
    index: usize,
    session: Option<Box<dyn EngineStream>>,
    last_volume: f32,
    loading: bool,
    on_exhausted: Box<dyn Fn() + Send + Sync>,
}

impl Player {
    pub fn new(engine: Arc<dyn AudioEngine>) -> Self {
        Self {
            engine,
            playlist: Playlist::new(),
            index: 0,
            session: None,
            last_volume: 1.0,
            loading: false,
            on_exhausted: Box::new(|| {}),
        }
    }

    /// Register the playlist-exhaustion listener, invoked synchronously
    /// whenever [`next`](Self::next) finds no further track. Single
    /// subscriber; the default is a no-op.
    pub fn set_on_exhausted<F: Fn() + Send + Sync + 'static>(&mut self, callback: F) {
        self.on_exhausted = Box::new(callback);
    }

    pub fn add_track(&mut self, path: PathBuf) {
        self.playlist.push(path);
    }

    pub fn add_tracks<I: IntoIterator<Item = PathBuf>>(&mut self, paths: I) {
        self.playlist.extend(paths);
    }

    /// One-time random permutation of the playlist.
    pub fn shuffle(&mut self) {
        self.playlist.shuffle();
    }

    pub fn playlist_len(&self) -> usize {
        self.playlist.len()
    }

    /// 1-based position for the wire protocol.
    pub fn playlist_index(&self) -> usize {
        self.index + 1
    }

    /// Display name (last path segment) of the current track.
    pub fn current_track_name(&self) -> Result<String> {
        self.playlist
            .display_name(self.index)
            .map(str::to_string)
            .ok_or(Error::NoCurrentTrack)
    }

    /// Load and start the track at the current index, replacing any existing
    /// session. The previous engine stream is released before the new load;
    /// on success the last applied volume carries over to the new stream.
    pub fn play(&mut self) -> Result<()> {
        let path = self
            .playlist
            .get(self.index)
            .ok_or(Error::NoCurrentTrack)?
            .to_path_buf();

        self.loading = true;
        self.session = None;

        let result = self.engine.load(&path).and_then(|mut stream| {
            stream.start()?;
            stream.set_volume(self.last_volume);
            Ok(stream)
        });

        match result {
            Ok(stream) => {
                self.session = Some(stream);
                self.loading = false;
                debug!("playing {}", path.display());
                Ok(())
            }
            Err(e) => {
                // The poll loop keys on `loading`; leaving it set here would
                // stall auto-advance forever.
                self.loading = false;
                Err(e)
            }
        }
    }

    /// Halt playback. The session stays loaded but reports stopped, so the
    /// idle poll treats it like a finished track.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.stop();
        }
    }

    /// No-op unless currently playing.
    pub fn pause(&mut self) {
        if self.is_playing() {
            if let Some(session) = self.session.as_mut() {
                session.pause();
            }
        }
    }

    /// No-op unless currently paused.
    pub fn resume(&mut self) {
        if self.is_paused() {
            if let Some(session) = self.session.as_mut() {
                if let Err(e) = session.start() {
                    warn!("resume failed: {}", e);
                }
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.state() == ChannelState::Playing)
    }

    pub fn is_paused(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.state() == ChannelState::Paused)
    }

    /// True while a load+start sequence is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Advance to the following track and start it, skipping tracks that
    /// fail to load. `Ok(false)` means the playlist is exhausted: the
    /// notification fires and the index does not move.
    pub fn next(&mut self) -> Result<bool> {
        if self.index + 1 >= self.playlist.len() {
            (self.on_exhausted)();
            return Ok(false);
        }
        self.stop();
        self.index += 1;
        self.play_skipping_failures(Direction::Forward)?;
        Ok(true)
    }

    /// Step back one track. `Ok(false)` means the player is already on the
    /// first track; nothing changes and no notification fires.
    pub fn prev(&mut self) -> Result<bool> {
        if self.index == 0 {
            return Ok(false);
        }
        self.stop();
        self.index -= 1;
        self.play_skipping_failures(Direction::Backward)?;
        Ok(true)
    }

    /// Retry `play` across load failures, moving the index one track at a
    /// time and stopping at the playlist edge. When every remaining track
    /// fails the whole range is reported as one load error and the index is
    /// left on the last track attempted.
    fn play_skipping_failures(&mut self, direction: Direction) -> Result<()> {
        loop {
            match self.play() {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        "skipping unplayable track #{}: {}",
                        self.playlist_index(),
                        e
                    );
                    self.index = match direction {
                        Direction::Forward if self.index + 1 < self.playlist.len() => {
                            self.index + 1
                        }
                        Direction::Backward if self.index > 0 => self.index - 1,
                        _ => {
                            return Err(Error::Load(
                                "no playable track in the remaining playlist".to_string(),
                            ))
                        }
                    };
                }
            }
        }
    }

    /// Seek to an absolute position. Out-of-range targets are resolved by
    /// the engine.
    pub fn seek_to(&mut self, seconds: f64) -> Result<()> {
        self.session
            .as_mut()
            .ok_or(Error::NoActiveSession)?
            .seek_secs(seconds)
    }

    pub fn position_secs(&self) -> Result<f64> {
        Ok(self
            .session
            .as_ref()
            .ok_or(Error::NoActiveSession)?
            .position_secs())
    }

    pub fn length_secs(&self) -> Result<f64> {
        Ok(self
            .session
            .as_ref()
            .ok_or(Error::NoActiveSession)?
            .length_secs())
    }

    /// Volume as the engine reports it right now (not the stored value).
    pub fn volume(&self) -> Result<f32> {
        Ok(self
            .session
            .as_ref()
            .ok_or(Error::NoActiveSession)?
            .volume())
    }

    /// Apply a volume. Values outside [`VOLUME_RANGE`] are rejected and the
    /// current volume stays as it was. Accepted values are rounded to three
    /// decimals before being stored and applied, so repeated relative
    /// adjustments do not drift.
    pub fn set_volume(&mut self, volume: f32) {
        if !VOLUME_RANGE.contains(&volume) {
            return;
        }
        let volume = (volume * 1000.0).round() / 1000.0;
        self.last_volume = volume;
        if let Some(session) = self.session.as_mut() {
            session.set_volume(volume);
        }
    }
}
