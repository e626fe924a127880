//! Server fixture: binds the session server on an ephemeral port with a
//! scripted engine and hands out connected clients.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use phonod::engine::AudioEngine;
use phonod::server::SessionServer;
use phonod::Player;
use phonod_common::Config;

use super::scripted_engine::ScriptedEngine;

pub struct TestServer {
    pub addr: SocketAddr,
    pub engine: Arc<ScriptedEngine>,
    pub player: Arc<Mutex<Player>>,
    exhausted: Arc<AtomicUsize>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<phonod::Result<()>>,
}

impl TestServer {
    /// Start a server with the idle poll effectively disabled, so protocol
    /// tests see only the state changes they caused themselves.
    pub async fn start(tracks: &[&str]) -> TestServer {
        Self::start_with(tracks, 60_000, None).await
    }

    pub async fn start_with(
        tracks: &[&str],
        poll_interval_ms: u64,
        client_read_timeout_secs: Option<u64>,
    ) -> TestServer {
        let engine = ScriptedEngine::new();

        let engine_concrete = Arc::clone(&engine);
        let engine_dyn: Arc<dyn AudioEngine> = engine_concrete;
        let mut player = Player::new(engine_dyn);
        player.add_tracks(tracks.iter().map(PathBuf::from));

        let exhausted = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&exhausted);
        player.set_on_exhausted(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        });

        let player = Arc::new(Mutex::new(player));

        let config = Config {
            bind_addr: "127.0.0.1:0".to_string(),
            poll_interval_ms,
            client_read_timeout_secs,
            ..Config::default()
        };

        let server = SessionServer::bind(&config, Arc::clone(&player))
            .await
            .expect("bind test server");
        let addr = server.local_addr().expect("test server address");

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(server.run(shutdown_rx));

        TestServer {
            addr,
            engine,
            player,
            exhausted,
            shutdown,
            task,
        }
    }

    pub async fn connect(&self) -> TestClient {
        TestClient {
            stream: TcpStream::connect(self.addr).await.expect("connect"),
        }
    }

    /// How many times the playlist-exhaustion notification has fired.
    pub fn exhausted_count(&self) -> usize {
        self.exhausted.load(Ordering::SeqCst)
    }

    pub async fn stop(self) {
        self.shutdown.send(true).expect("signal shutdown");
        self.task
            .await
            .expect("server task join")
            .expect("server result");
    }
}

pub struct TestClient {
    stream: TcpStream,
}

impl TestClient {
    /// Send one command and wait for its response.
    pub async fn send(&mut self, command: &str) -> String {
        self.stream
            .write_all(command.as_bytes())
            .await
            .expect("send command");
        self.recv(Duration::from_secs(5))
            .await
            .expect("response before timeout")
    }

    /// Send a command padded with NUL bytes, as fixed-buffer clients do.
    pub async fn send_padded(&mut self, command: &str) -> String {
        let mut frame = command.as_bytes().to_vec();
        frame.resize(64, 0);
        self.stream.write_all(&frame).await.expect("send command");
        self.recv(Duration::from_secs(5))
            .await
            .expect("response before timeout")
    }

    /// Send a command and assert that no response arrives within `wait`
    /// (the connection is not being served yet).
    pub async fn send_expecting_silence(&mut self, command: &str, wait: Duration) {
        self.stream
            .write_all(command.as_bytes())
            .await
            .expect("send command");
        let mut buf = [0u8; 128];
        match timeout(wait, self.stream.read(&mut buf)).await {
            Err(_) => {} // nothing served, as expected
            Ok(Ok(0)) => panic!("connection was closed"),
            Ok(other) => panic!("unexpected response: {:?}", other),
        }
    }

    /// Wait up to `wait` for a response to an already-sent command.
    pub async fn recv(&mut self, wait: Duration) -> Option<String> {
        let mut buf = [0u8; 1024];
        match timeout(wait, self.stream.read(&mut buf)).await {
            Ok(Ok(0)) | Err(_) => None,
            Ok(Ok(n)) => Some(String::from_utf8_lossy(&buf[..n]).to_string()),
            Ok(Err(_)) => None,
        }
    }
}
