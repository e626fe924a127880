//! TCP command server
//!
//! Owns the listener and the single-connection slot. One `select!` loop
//! multiplexes three concerns: accepting a client while the slot is free,
//! the idle poll that advances the playlist when a track has run out, and
//! shutdown. The per-client receive/dispatch/respond loop runs as its own
//! task so blocking network I/O never stalls the poll.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use phonod_common::time::format_clock;
use phonod_common::Config;

use crate::dispatch;
use crate::error::{Error, Result};
use crate::player::Player;

/// Largest accepted command frame in bytes.
pub const MAX_FRAME: usize = 1024;

/// The command protocol server.
pub struct SessionServer {
    listener: TcpListener,
    player: Arc<Mutex<Player>>,
    poll_interval: Duration,
    read_timeout: Option<Duration>,
}

impl SessionServer {
    /// Bind the command endpoint. Serving starts with [`run`](Self::run).
    pub async fn bind(config: &Config, player: Arc<Mutex<Player>>) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .map_err(|e| Error::Net(format!("failed to bind {}: {}", config.bind_addr, e)))?;

        Ok(Self {
            listener,
            player,
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            read_timeout: config.client_read_timeout_secs.map(Duration::from_secs),
        })
    }

    /// The bound address (the actual port when binding port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| Error::Net(e.to_string()))
    }

    /// Serve until the shutdown signal flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!("command server listening on {}", self.local_addr()?);

        // First tick after one full interval, not immediately: completion is
        // only inferred once playback has had a chance to report state.
        let mut poll = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The serving task reports back here when it ends, freeing the slot.
        let (done_tx, mut done_rx) = mpsc::channel::<()>(1);

        let mut client: Option<JoinHandle<()>> = None;
        // Once the playlist has run out, stop re-signaling exhaustion every
        // tick; re-armed as soon as playback activity is seen again.
        let mut exhausted = false;

        loop {
            tokio::select! {
                accepted = self.listener.accept(), if client.is_none() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            info!("client connected: {}", addr);
                            let player = Arc::clone(&self.player);
                            let read_timeout = self.read_timeout;
                            let done = done_tx.clone();
                            client = Some(tokio::spawn(async move {
                                serve_client(stream, addr, player, read_timeout).await;
                                let _ = done.send(()).await;
                            }));
                        }
                        Err(e) => warn!("accept failed: {}", e),
                    }
                }
                _ = done_rx.recv() => {
                    client = None;
                }
                _ = poll.tick() => {
                    self.idle_poll(&mut exhausted).await;
                }
                _ = shutdown.changed() => {
                    break;
                }
            }
        }

        if let Some(handle) = client {
            handle.abort();
        }
        info!("command server stopped");
        Ok(())
    }

    /// Track completion is inferred, not signaled: a player that is neither
    /// playing nor paused nor mid-load has run out of audio, so the playlist
    /// advances. Worst case this adds one poll interval of silence between
    /// tracks.
    async fn idle_poll(&self, exhausted: &mut bool) {
        let mut player = self.player.lock().await;

        if player.is_playing() || player.is_paused() || player.is_loading() {
            *exhausted = false;
            return;
        }
        if *exhausted {
            return;
        }

        match player.next() {
            Ok(true) => {
                let name = player.current_track_name().unwrap_or_default();
                let length = player.length_secs().unwrap_or(0.0);
                info!("auto-advanced to {} ({})", name, format_clock(length));
            }
            Ok(false) => {
                info!("end of playlist reached");
                *exhausted = true;
            }
            Err(e) => {
                warn!("auto-advance failed: {}", e);
                *exhausted = true;
            }
        }
    }
}

/// Per-client receive/dispatch/respond loop. Any read or write failure, EOF,
/// or an expired read timeout ends the loop and releases the slot.
async fn serve_client(
    mut stream: TcpStream,
    addr: SocketAddr,
    player: Arc<Mutex<Player>>,
    read_timeout: Option<Duration>,
) {
    let mut buf = [0u8; MAX_FRAME];

    loop {
        let read = match read_timeout {
            Some(limit) => match timeout(limit, stream.read(&mut buf)).await {
                Ok(read) => read,
                Err(_) => {
                    info!("client {} timed out", addr);
                    return;
                }
            },
            None => stream.read(&mut buf).await,
        };

        let received = match read {
            Ok(0) => {
                info!("client disconnected: {}", addr);
                return;
            }
            Ok(n) => n,
            Err(e) => {
                info!("client {} read error: {}", addr, e);
                return;
            }
        };

        let command = decode_command(&buf[..received]);
        debug!("received command {:?} from {}", command, addr);

        let response = {
            let mut player = player.lock().await;
            dispatch::dispatch(&mut player, &command)
        };

        if let Err(e) = stream.write_all(response.as_bytes()).await {
            info!("client {} write error: {}", addr, e);
            return;
        }
    }
}

/// Decode a raw frame into a command token: lossy UTF-8, NUL padding
/// removed, surrounding whitespace trimmed. Fixed-buffer clients pad frames
/// with NUL bytes.
fn decode_command(frame: &[u8]) -> String {
    String::from_utf8_lossy(frame)
        .replace('\0', "")
        .trim()
        .to_string()
}
