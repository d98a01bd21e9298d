//! Hertz Player (hertz-player) - Main entry point
//!
//! Runs the per-guild playback session manager behind an HTTP command
//! surface. Without a voice transport wired in, sessions render through the
//! wall-clock `TimedDriver`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hertz_common::config::TomlConfig;
use hertz_common::events::EventBus;
use hertz_common::time::secs_to_duration;
use hertz_common::GuildId;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hertz_player::api;
use hertz_player::commands::MusicCommands;
use hertz_player::driver::{DriverFactory, PlaybackDriver, TimedDriver};
use hertz_player::notifier::{CompositeNotifier, EventNotifier, LogNotifier, Notifier};
use hertz_player::resolver::YtDlpResolver;
use hertz_player::session::SessionConfig;
use hertz_player::SessionRegistry;

/// Command-line arguments for hertz-player
#[derive(Parser, Debug)]
#[command(name = "hertz-player")]
#[command(about = "Per-guild playback session manager")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "HERTZ_PORT")]
    port: Option<u16>,

    /// Configuration file
    #[arg(short, long, env = "HERTZ_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Configuration is needed before tracing so the configured level applies
    let config = TomlConfig::resolve(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = args.port.unwrap_or(config.port);
    info!("Starting Hertz Player on port {}", port);

    let events = EventBus::new(config.playback.event_capacity);

    let notifier: Arc<dyn Notifier> = Arc::new(
        CompositeNotifier::default()
            .with(Arc::new(EventNotifier::new(events.clone())))
            .with(Arc::new(LogNotifier)),
    );

    let unknown_duration = secs_to_duration(config.playback.unknown_duration_secs);
    let drivers: Arc<dyn DriverFactory> = Arc::new(move |_guild: GuildId| {
        Arc::new(TimedDriver::new(unknown_duration)) as Arc<dyn PlaybackDriver>
    });

    let registry = Arc::new(SessionRegistry::new(
        drivers,
        notifier,
        SessionConfig::from(&config.playback),
    ));
    info!("Session registry initialized");

    let resolver = Arc::new(
        YtDlpResolver::new(config.resolver.yt_dlp_path.clone())
            .with_timeout(secs_to_duration(config.resolver.timeout_secs)),
    );
    let commands = MusicCommands::new(Arc::clone(&registry), resolver);

    let app_state = api::AppState {
        commands,
        events,
        port,
    };

    api::serve(app_state, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    registry.shutdown().await;
    info!("Server shutdown complete");
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
