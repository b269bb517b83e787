//! TOML configuration for the gateway.
//!
//! Example:
//!
//! ```toml
//! [device]
//! id = "living-room-ir"
//!
//! [mqtt]
//! host = "broker.local"
//! port = 1883
//! username = "ir"
//! password = "secret"
//! base_topic = "ghs/livingroom/ir"
//!
//! [log]
//! level = "debug"
//! ```
//!
//! Every field is optional.  Fields annotated with
//! `#[serde(default = "some_fn")]` take the value of `some_fn()` when absent,
//! and a missing file is the same as an empty one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Credentials, GatewayConfig};

/// Smallest keep-alive the broker connection accepts.
pub const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not usable.
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceSection,
    #[serde(default)]
    pub mqtt: MqttSection,
    #[serde(default)]
    pub log: LogSection,
}

/// Device identity.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeviceSection {
    /// Device identifier, also used as the MQTT client id.
    #[serde(default = "default_device_id")]
    pub id: String,
}

/// Broker connection and topic settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MqttSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Base topic; commands arrive on `<base>/command`, presence on
    /// `<base>/online`.
    #[serde(default = "default_base_topic")]
    pub base_topic: String,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    /// Fixed wait between failed connect attempts.
    #[serde(default = "default_reconnect_backoff_secs")]
    pub reconnect_backoff_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// How long each bus I/O service call waits for traffic.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LogSection {
    /// `tracing` filter directive: `"error"`, `"warn"`, `"info"`, `"debug"`,
    /// `"trace"`, or a full `EnvFilter` string.  `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_device_id() -> String {
    "IR-MQTT-Gateway".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    1883
}
fn default_base_topic() -> String {
    "home/ir".to_string()
}
fn default_keep_alive_secs() -> u64 {
    15
}
fn default_reconnect_backoff_secs() -> u64 {
    5
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_poll_interval_ms() -> u64 {
    20
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            id: default_device_id(),
        }
    }
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            base_topic: default_base_topic(),
            keep_alive_secs: default_keep_alive_secs(),
            reconnect_backoff_secs: default_reconnect_backoff_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Loading and validation ────────────────────────────────────────────────────

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

impl AppConfig {
    /// Validates the file values into the runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn into_gateway_config(self) -> Result<GatewayConfig, ConfigError> {
        let device_id = self.device.id.trim().to_string();
        if device_id.is_empty() {
            return Err(invalid("device.id", "must not be empty"));
        }

        let mqtt = self.mqtt;
        if mqtt.host.trim().is_empty() {
            return Err(invalid("mqtt.host", "must not be empty"));
        }
        if mqtt.port == 0 {
            return Err(invalid("mqtt.port", "must not be 0"));
        }
        validate_base_topic(&mqtt.base_topic)?;
        if mqtt.keep_alive_secs < MIN_KEEP_ALIVE_SECS {
            return Err(invalid(
                "mqtt.keep_alive_secs",
                format!("must be at least {MIN_KEEP_ALIVE_SECS}"),
            ));
        }
        for (field, value) in [
            ("mqtt.reconnect_backoff_secs", mqtt.reconnect_backoff_secs),
            ("mqtt.connect_timeout_secs", mqtt.connect_timeout_secs),
            ("mqtt.poll_interval_ms", mqtt.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(invalid(field, "must not be 0"));
            }
        }

        let credentials = match (mqtt.username, mqtt.password) {
            (Some(username), password) => Some(Credentials {
                username,
                password: password.unwrap_or_default(),
            }),
            (None, Some(_)) => {
                return Err(invalid("mqtt.password", "set without mqtt.username"));
            }
            (None, None) => None,
        };

        Ok(GatewayConfig {
            device_id,
            broker_host: mqtt.host,
            broker_port: mqtt.port,
            credentials,
            base_topic: mqtt.base_topic,
            keep_alive: Duration::from_secs(mqtt.keep_alive_secs),
            reconnect_backoff: Duration::from_secs(mqtt.reconnect_backoff_secs),
            connect_timeout: Duration::from_secs(mqtt.connect_timeout_secs),
            poll_interval: Duration::from_millis(mqtt.poll_interval_ms),
        })
    }
}

fn validate_base_topic(topic: &str) -> Result<(), ConfigError> {
    if topic.is_empty() {
        return Err(invalid("mqtt.base_topic", "must not be empty"));
    }
    if topic.contains(['+', '#']) {
        return Err(invalid(
            "mqtt.base_topic",
            "must not contain MQTT wildcards (+ or #)",
        ));
    }
    if topic.ends_with('/') {
        return Err(invalid("mqtt.base_topic", "must not end with '/'"));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
