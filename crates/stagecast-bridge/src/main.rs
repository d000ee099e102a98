//! StageCast bridge entry point.
//!
//! This binary captures body-tracking and MIDI controller events and fans
//! them out to WebSocket subscribers:
//!
//! ```text
//! body sensor ──► frame assembler ──► publisher ──► dispatch ──► N subscribers
//! MIDI device ──► state cache    ──►   (same publisher / hub)
//! ```
//!
//! # Usage
//!
//! ```text
//! stagecast-bridge [OPTIONS]
//!
//! Options:
//!   --ws-port <PORT>           WebSocket listener port [default: 8080]
//!   --ws-bind <ADDR>           WebSocket bind address [default: 0.0.0.0]
//!   --config <PATH>            Optional TOML config file
//!   --event-capacity <N>       Publisher event queue capacity [default: 256]
//!   --max-subscribers <N>      Subscriber connection limit [default: 64]
//!   --body-rate <HZ>           Synthetic body sample rate [default: 30]
//!   --body-drop-every <N>      Report every Nth capture cycle as dropped
//!   --midi-port <N>            MIDI input port index [default: 0]
//!   --no-midi                  Run without the controller source
//! ```
//!
//! # Environment variable overrides
//!
//! Every option can also come from the environment (CLI wins when both
//! are present):
//!
//! | Variable                  | Option              |
//! |---------------------------|---------------------|
//! | `STAGECAST_WS_PORT`       | `--ws-port`         |
//! | `STAGECAST_WS_BIND`       | `--ws-bind`         |
//! | `STAGECAST_CONFIG`        | `--config`          |
//! | `STAGECAST_BODY_RATE`     | `--body-rate`       |
//! | `STAGECAST_MIDI_PORT`     | `--midi-port`       |
//!
//! Precedence overall: built-in defaults < config file < flags/env.
//!
//! # Shutdown
//!
//! Ctrl+C clears a shared flag; the accept loop notices within 200 ms and
//! stops, the capture sources are stopped, and in-flight reconnects are
//! abandoned with the process.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stagecast_core::{OutgoingEvent, PinholeMapper, ProjectionMapper};

use stagecast_bridge::application::pipeline::{run_body_loop, run_controller_loop};
use stagecast_bridge::application::PublisherConnection;
use stagecast_bridge::domain::BridgeConfig;
use stagecast_bridge::infrastructure::body_source::{synthetic::SyntheticBodySource, BodySource};
use stagecast_bridge::infrastructure::midi_source::{
    device::MidirControllerSource, ControllerSource,
};
use stagecast_bridge::infrastructure::storage::{load_config, FileConfig};
use stagecast_bridge::infrastructure::{run_dispatch, run_server, Hub, HubConnector};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// StageCast bridge.
///
/// Captures body-tracking and MIDI controller events and broadcasts them
/// to WebSocket subscribers.
#[derive(Debug, Parser)]
#[command(
    name = "stagecast-bridge",
    about = "Real-time body-tracking and MIDI broadcast bridge",
    version
)]
struct Cli {
    /// TCP port for the subscriber WebSocket server.
    #[arg(long, env = "STAGECAST_WS_PORT")]
    ws_port: Option<u16>,

    /// IP address to bind the WebSocket server to.
    ///
    /// Use `0.0.0.0` to accept subscribers from any interface, or
    /// `127.0.0.1` for local-only.
    #[arg(long, env = "STAGECAST_WS_BIND")]
    ws_bind: Option<String>,

    /// Optional TOML config file; flags override its values.
    #[arg(long, env = "STAGECAST_CONFIG")]
    config: Option<PathBuf>,

    /// Capacity of the publisher → dispatch event queue.
    #[arg(long, env = "STAGECAST_EVENT_CAPACITY")]
    event_capacity: Option<usize>,

    /// Maximum number of concurrent subscribers.
    #[arg(long, env = "STAGECAST_MAX_SUBSCRIBERS")]
    max_subscribers: Option<usize>,

    /// Synthetic body source sample rate in Hz.
    #[arg(long, env = "STAGECAST_BODY_RATE")]
    body_rate: Option<u32>,

    /// Report every Nth synthetic capture cycle as an acquisition miss.
    #[arg(long, env = "STAGECAST_BODY_DROP_EVERY")]
    body_drop_every: Option<u32>,

    /// MIDI input port index to open.
    #[arg(long, env = "STAGECAST_MIDI_PORT")]
    midi_port: Option<usize>,

    /// Run without the MIDI controller source.
    #[arg(long, env = "STAGECAST_NO_MIDI")]
    no_midi: bool,
}

impl Cli {
    /// Builds the effective [`BridgeConfig`]: defaults, then the config
    /// file, then CLI/env flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address does not parse or the config
    /// file exists but cannot be read or parsed.
    fn into_bridge_config(self, file: Option<FileConfig>) -> anyhow::Result<BridgeConfig> {
        let mut config = BridgeConfig::default();

        if let Some(file) = file {
            file.apply(&mut config).context("invalid config file")?;
        }

        if self.ws_bind.is_some() || self.ws_port.is_some() {
            let bind = self
                .ws_bind
                .unwrap_or_else(|| config.ws_bind_addr.ip().to_string());
            let port = self.ws_port.unwrap_or_else(|| config.ws_bind_addr.port());
            config.ws_bind_addr = format!("{bind}:{port}")
                .parse::<SocketAddr>()
                .with_context(|| format!("invalid WebSocket bind address: '{bind}:{port}'"))?;
        }

        if let Some(capacity) = self.event_capacity {
            config.event_capacity = capacity;
        }
        if let Some(max) = self.max_subscribers {
            config.max_subscribers = max;
        }
        if let Some(rate) = self.body_rate {
            config.body_rate_hz = rate;
        }
        if let Some(drop) = self.body_drop_every {
            config.body_drop_every = Some(drop);
        }
        if let Some(port) = self.midi_port {
            config.midi_port = port;
        }
        if self.no_midi {
            config.midi_enabled = false;
        }

        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log level comes from RUST_LOG; default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => Some(load_config(path).context("failed to load config file")?),
        None => None,
    };
    let config = cli.into_bridge_config(file)?;

    info!(
        "StageCast bridge starting: ws={}, body_rate={}Hz, midi={}",
        config.ws_bind_addr,
        config.body_rate_hz,
        if config.midi_enabled { "on" } else { "off" }
    );

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_ctrlc = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; initiating graceful shutdown");
                running_ctrlc.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    // ── Fan-out plumbing ──────────────────────────────────────────────────────
    //
    // Publishes go into a bounded queue; the dispatch task drains it and
    // owns the hub handle.  The publisher is the pipeline's internal
    // client of that boundary.
    let hub = Arc::new(Hub::new(config.max_subscribers));
    let (event_tx, event_rx) = mpsc::channel::<OutgoingEvent>(config.event_capacity);
    tokio::spawn(run_dispatch(Arc::clone(&hub), event_rx));

    let connector = Arc::new(HubConnector::new(event_tx));
    let publisher = PublisherConnection::new(connector);
    publisher.connect();

    // ── Body source ───────────────────────────────────────────────────────────
    let body_source = SyntheticBodySource::new(config.body_rate_hz, config.body_drop_every);
    let body_rx = body_source
        .start()
        .context("failed to start the body source")?;
    let mapper: Arc<dyn ProjectionMapper> = Arc::new(PinholeMapper::default());
    let body_publisher = publisher.clone();
    tokio::task::spawn_blocking(move || run_body_loop(body_rx, mapper, body_publisher));

    // ── Controller source ─────────────────────────────────────────────────────
    //
    // A missing device is not fatal: the session runs on whichever sources
    // remain available.
    let midi_source = MidirControllerSource::new(config.midi_port);
    if config.midi_enabled {
        match midi_source.start() {
            Ok(midi_rx) => {
                let midi_publisher = publisher.clone();
                tokio::task::spawn_blocking(move || run_controller_loop(midi_rx, midi_publisher));
            }
            Err(e) => {
                warn!("MIDI device: {e}; controller input disabled for this session");
            }
        }
    }

    // ── Subscriber server ─────────────────────────────────────────────────────
    run_server(&config, Arc::clone(&hub), running).await?;

    // Teardown in reverse: stop the sources; the capture loops drain and
    // exit as their channels close, and in-flight reconnects are abandoned
    // with the process.
    midi_source.stop();
    body_source.stop();

    info!("StageCast bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
