//! Test helper modules for phonod integration tests
//!
//! Provides reusable test infrastructure:
//! - ScriptedEngine: audio backend double, no hardware needed
//! - TestServer/TestClient: run the session server on an ephemeral port and
//!   drive it over a real TCP connection
#![allow(dead_code)]

pub mod scripted_engine;
pub mod test_server;

pub use scripted_engine::{ScriptedEngine, TrackSpec};
pub use test_server::{TestClient, TestServer};
