//! phonod - main entry point
//!
//! Wires the pieces together: configuration, audio engine, library scan,
//! player, command server, and orderly shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phonod::engine::RodioEngine;
use phonod::server::SessionServer;
use phonod::{library, Player};
use phonod_common::time::format_clock;
use phonod_common::Config;

/// Command-line arguments for phonod
#[derive(Parser, Debug)]
#[command(name = "phonod")]
#[command(about = "Remote-controllable music player daemon")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "PHONOD_CONFIG")]
    config: Option<PathBuf>,

    /// Address for the command server, e.g. 127.0.0.1:2806
    #[arg(short, long, env = "PHONOD_BIND_ADDR")]
    bind_addr: Option<String>,

    /// Root folder scanned for tracks
    #[arg(short, long, env = "PHONOD_MUSIC_DIR")]
    music_dir: Option<PathBuf>,

    /// Keep the scanned order instead of shuffling once at startup
    #[arg(long)]
    no_shuffle: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phonod=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config =
        Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind_addr) = args.bind_addr {
        config.bind_addr = bind_addr;
    }
    if let Some(music_dir) = args.music_dir {
        config.music_dir = music_dir;
    }
    if args.no_shuffle {
        config.shuffle = false;
    }

    info!("Starting phonod on {}", config.bind_addr);
    info!("Music folder: {}", config.music_dir.display());

    // No audio device is the one fatal startup error
    let engine = RodioEngine::init().context("Failed to initialize audio engine")?;

    let tracks = library::scan(&config.music_dir);
    if tracks.is_empty() {
        warn!("no tracks found under {}", config.music_dir.display());
    } else {
        info!("found {} tracks", tracks.len());
    }

    let mut player = Player::new(Arc::new(engine));
    player.add_tracks(tracks);
    if config.shuffle {
        player.shuffle();
    }
    player.set_on_exhausted(|| info!("playlist finished"));

    match player.play() {
        Ok(()) => {
            let name = player.current_track_name().unwrap_or_default();
            let length = player.length_secs().unwrap_or(0.0);
            info!("player started: {} ({})", name, format_clock(length));
        }
        Err(e) => warn!("initial play failed: {}", e),
    }

    let player = Arc::new(Mutex::new(player));
    let server = SessionServer::bind(&config, Arc::clone(&player))
        .await
        .context("Failed to start command server")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server_task = tokio::spawn(server.run(shutdown_rx));

    shutdown_signal().await;

    shutdown_tx.send(true).ok();
    server_task.await.context("Server task panicked")??;

    // Halt playback and release the engine stream before exiting
    player.lock().await.stop();

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
