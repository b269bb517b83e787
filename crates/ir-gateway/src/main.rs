//! ir-gateway entry point.
//!
//! Loads the configuration, wires the MQTT bus and the transceiver into a
//! [`Gateway`], and runs its loop on a single-threaded tokio runtime until
//! Ctrl+C.
//!
//! # Configuration precedence
//!
//! 1. CLI flags (or their `IRGW_*` environment variables)
//! 2. the TOML file given by `--config` (default `ir-gateway.toml`)
//! 3. built-in defaults
//!
//! `RUST_LOG` overrides the configured log level.
//!
//! # Shutdown
//!
//! A clean MQTT disconnect suppresses the broker's last will, so on Ctrl+C the
//! gateway publishes `"false"` to its presence topic itself before
//! disconnecting.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ir_gateway::application::Gateway;
use ir_gateway::infrastructure::bus::MqttBus;
use ir_gateway::infrastructure::clock::TokioClock;
use ir_gateway::infrastructure::storage::config::{load_config, AppConfig};
use ir_gateway::infrastructure::transceiver::DryRunTransceiver;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Infrared remote-control to MQTT gateway.
#[derive(Debug, Parser)]
#[command(
    name = "ir-gateway",
    about = "Bridges an infrared remote-control transceiver and an MQTT broker",
    version
)]
struct Cli {
    /// Path of the TOML configuration file.  A missing file means defaults.
    #[arg(long, default_value = "ir-gateway.toml", env = "IRGW_CONFIG")]
    config: PathBuf,

    /// Hostname or IP address of the MQTT broker.
    #[arg(long, env = "IRGW_BROKER_HOST")]
    broker_host: Option<String>,

    /// TCP port of the MQTT broker.
    #[arg(long, env = "IRGW_BROKER_PORT")]
    broker_port: Option<u16>,

    /// Base topic; commands are read from `<base>/command`.
    #[arg(long, env = "IRGW_BASE_TOPIC")]
    base_topic: Option<String>,

    /// Device identifier, used as the MQTT client id.
    #[arg(long, env = "IRGW_DEVICE_ID")]
    device_id: Option<String>,

    /// MQTT username.
    #[arg(long, env = "IRGW_USERNAME")]
    username: Option<String>,

    /// MQTT password.
    #[arg(long, env = "IRGW_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl Cli {
    /// Overwrites file values with whatever was given on the command line.
    fn apply_overrides(self, config: &mut AppConfig) {
        if let Some(host) = self.broker_host {
            config.mqtt.host = host;
        }
        if let Some(port) = self.broker_port {
            config.mqtt.port = port;
        }
        if let Some(topic) = self.base_topic {
            config.mqtt.base_topic = topic;
        }
        if let Some(id) = self.device_id {
            config.device.id = id;
        }
        if let Some(username) = self.username {
            config.mqtt.username = Some(username);
        }
        if let Some(password) = self.password {
            config.mqtt.password = Some(password);
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone();
    let mut app_config = load_config(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    cli.apply_overrides(&mut app_config);

    init_logging(&app_config.log.level);

    let config = app_config
        .into_gateway_config()
        .context("invalid configuration")?;

    info!(
        "IR gateway starting: device={}, broker={}:{}, topic={}",
        config.device_id, config.broker_host, config.broker_port, config.base_topic
    );
    warn!("no IR hardware backend configured; commands are logged, not emitted");

    let bus = MqttBus::new(&config);
    let mut gateway = Gateway::new(&config, bus, DryRunTransceiver::new(), Box::new(TokioClock));

    tokio::select! {
        () = gateway.run() => {}
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        },
    }

    gateway.shutdown().await;
    info!("IR gateway stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
