//! Command dispatch
//!
//! Stateless mapping from the wire command vocabulary to player operations,
//! and from player results to response strings. Unknown input is answered
//! with the `"null"` sentinel rather than an error, by design; the same
//! sentinel answers queries that cannot be satisfied (no track loaded),
//! since the protocol has no error frame.

use tracing::{debug, warn};

use crate::error::Result;
use crate::player::Player;

/// Response for commands with no payload, for unknown commands, and for
/// unanswerable queries.
pub const NULL_RESPONSE: &str = "null";

/// Relative seek step for `forward`/`backward`, in seconds.
const SEEK_STEP_SECS: f64 = 5.0;

/// Relative seek step for `long_forward`/`long_backward`, in seconds.
const LONG_SEEK_STEP_SECS: f64 = 30.0;

/// Step applied by `volume_up`/`volume_down`.
const VOLUME_STEP: f32 = 0.05;

/// The fixed command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Stop,
    Pause,
    Resume,
    GetPlayerState,
    VolumeUp,
    VolumeDown,
    Forward,
    Backward,
    LongForward,
    LongBackward,
    GetCurrentSong,
    GetPosition,
    GetLength,
    GetPlaylistIndex,
    GetPlaylistLength,
    GetVolume,
    Next,
    Prev,
}

impl Command {
    /// Exact-match lookup. No partial matching and no case folding; the
    /// transport has already stripped whitespace and NUL padding.
    pub fn parse(raw: &str) -> Option<Command> {
        use Command::*;
        Some(match raw {
            "play" => Play,
            "stop" => Stop,
            "pause" => Pause,
            "resume" => Resume,
            "get_player_state" => GetPlayerState,
            "volume_up" => VolumeUp,
            "volume_down" => VolumeDown,
            "forward" => Forward,
            "backward" => Backward,
            "long_forward" => LongForward,
            "long_backward" => LongBackward,
            "get_current_song" => GetCurrentSong,
            "get_position" => GetPosition,
            "get_length" => GetLength,
            "get_pl_index" => GetPlaylistIndex,
            "get_pl_length" => GetPlaylistLength,
            "get_volume" => GetVolume,
            "next" => Next,
            "prev" => Prev,
            _ => return None,
        })
    }
}

/// Execute one command against the player and produce the wire response.
pub fn dispatch(player: &mut Player, raw: &str) -> String {
    let Some(command) = Command::parse(raw) else {
        debug!("ignoring unknown command {:?}", raw);
        return NULL_RESPONSE.to_string();
    };

    match command {
        Command::Play => {
            if let Err(e) = player.play() {
                warn!("play failed: {}", e);
            }
            null()
        }
        Command::Stop => {
            player.stop();
            null()
        }
        Command::Pause => {
            player.pause();
            null()
        }
        Command::Resume => {
            player.resume();
            null()
        }
        Command::GetPlayerState => {
            if player.is_playing() {
                "playing".to_string()
            } else if player.is_paused() {
                "paused".to_string()
            } else {
                "unknown".to_string()
            }
        }
        Command::VolumeUp => adjust_volume(player, VOLUME_STEP),
        Command::VolumeDown => adjust_volume(player, -VOLUME_STEP),
        Command::Forward => seek_relative(player, SEEK_STEP_SECS),
        Command::Backward => seek_relative(player, -SEEK_STEP_SECS),
        Command::LongForward => seek_relative(player, LONG_SEEK_STEP_SECS),
        Command::LongBackward => seek_relative(player, -LONG_SEEK_STEP_SECS),
        Command::GetCurrentSong => player.current_track_name().unwrap_or_else(|_| null()),
        Command::GetPosition => number(player.position_secs()),
        Command::GetLength => number(player.length_secs()),
        Command::GetPlaylistIndex => player.playlist_index().to_string(),
        Command::GetPlaylistLength => player.playlist_len().to_string(),
        Command::GetVolume => match player.volume() {
            Ok(volume) => format!("{}", volume),
            Err(_) => null(),
        },
        Command::Next => {
            if let Err(e) = player.next() {
                warn!("next failed: {}", e);
            }
            null()
        }
        Command::Prev => {
            if let Err(e) = player.prev() {
                warn!("prev failed: {}", e);
            }
            null()
        }
    }
}

fn null() -> String {
    NULL_RESPONSE.to_string()
}

/// Volume deltas apply to the volume the engine reports right now, not to
/// the stored last-applied value. With no session there is nothing to read,
/// and nothing changes.
fn adjust_volume(player: &mut Player, delta: f32) -> String {
    if let Ok(current) = player.volume() {
        player.set_volume(current + delta);
    }
    null()
}

fn seek_relative(player: &mut Player, delta: f64) -> String {
    if let Ok(position) = player.position_secs() {
        if let Err(e) = player.seek_to(position + delta) {
            debug!("seek rejected: {}", e);
        }
    }
    null()
}

fn number(value: Result<f64>) -> String {
    match value {
        Ok(v) => format!("{}", v),
        Err(_) => null(),
    }
}
