//! # phonod — remote-controllable music player daemon
//!
//! Maintains a playlist, drives an external audio backend, and exposes
//! playback control over a TCP command channel to one client at a time.
//!
//! **Architecture:** a playback state machine ([`player::Player`]) behind a
//! single lock, shared by the connection-accept loop, the per-client command
//! loop and the idle-poll loop that auto-advances the playlist
//! ([`server::SessionServer`]). Audio decoding and device output live behind
//! the [`engine::AudioEngine`] capability.

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod library;
pub mod player;
pub mod playlist;
pub mod server;

pub use error::{Error, Result};
pub use player::Player;
