//! Error types for phonod
//!
//! Defines daemon-specific error types using thiserror for clear error
//! propagation. Only `EngineInit` is allowed to terminate the process;
//! everything else is contained at the operation that produced it.

use thiserror::Error;

/// Main error type for the phonod daemon
#[derive(Error, Debug)]
pub enum Error {
    /// Audio device or backend initialization failure (fatal at startup)
    #[error("Audio engine init failed: {0}")]
    EngineInit(String),

    /// A track could not be opened or decoded
    #[error("Load error: {0}")]
    Load(String),

    /// A loaded track could not start playing
    #[error("Start error: {0}")]
    Start(String),

    /// Seeking was rejected by the backend
    #[error("Seek error: {0}")]
    Seek(String),

    /// A session-bound query or seek was issued with no track loaded
    #[error("No track loaded")]
    NoActiveSession,

    /// The playlist has no track at the current position
    #[error("Playlist has no current track")]
    NoCurrentTrack,

    /// Command server errors (bind, listener)
    #[error("Network error: {0}")]
    Net(String),

    /// File I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using the phonod Error
pub type Result<T> = std::result::Result<T, Error>;
