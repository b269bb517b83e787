//! Runtime configuration of the gateway.
//!
//! [`GatewayConfig`] is the single source of truth for all runtime settings.
//! It is built once at startup from the TOML file plus CLI overrides (see
//! `infrastructure::storage::config`) and never changes afterwards.
//!
//! The device identifier doubles as the MQTT client id, so one name
//! identifies the device on the broker and in fleet tooling.

use std::time::Duration;

use ir_gateway_core::Topics;

/// MQTT username and password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// Keep the password out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// All runtime configuration for the gateway.
///
/// # Example
///
/// ```rust
/// use ir_gateway::domain::GatewayConfig;
///
/// let cfg = GatewayConfig::default();
/// assert_eq!(cfg.broker_port, 1883);
/// assert_eq!(cfg.topics().online(), "home/ir/online");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Device identifier, used as the MQTT client id.
    pub device_id: String,

    /// Hostname or IP address of the MQTT broker.
    pub broker_host: String,

    /// TCP port of the MQTT broker.
    pub broker_port: u16,

    /// Optional broker credentials.
    pub credentials: Option<Credentials>,

    /// Base topic `T`; events go to `T`, commands arrive on `T/command`,
    /// presence is kept on `T/online`.
    pub base_topic: String,

    /// MQTT keep-alive interval.  The broker publishes the last will once
    /// roughly 1.5× this interval passes without traffic.
    pub keep_alive: Duration,

    /// Fixed wait between failed connect attempts.
    pub reconnect_backoff: Duration,

    /// Upper bound on one connect handshake.
    pub connect_timeout: Duration,

    /// How long one bus I/O service call waits for traffic.  Paces the
    /// gateway loop.
    pub poll_interval: Duration,
}

impl GatewayConfig {
    /// Topic names derived from [`GatewayConfig::base_topic`].
    pub fn topics(&self) -> Topics {
        Topics::from_base(self.base_topic.clone())
    }
}

impl Default for GatewayConfig {
    /// | Field             | Default             |
    /// |-------------------|---------------------|
    /// | device_id         | `IR-MQTT-Gateway`   |
    /// | broker            | `127.0.0.1:1883`    |
    /// | credentials       | none                |
    /// | base_topic        | `home/ir`           |
    /// | keep_alive        | 15 seconds          |
    /// | reconnect_backoff | 5 seconds           |
    /// | connect_timeout   | 10 seconds          |
    /// | poll_interval     | 20 milliseconds     |
    fn default() -> Self {
        Self {
            device_id: "IR-MQTT-Gateway".to_string(),
            broker_host: "127.0.0.1".to_string(),
            broker_port: 1883,
            credentials: None,
            base_topic: "home/ir".to_string(),
            keep_alive: Duration::from_secs(15),
            reconnect_backoff: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(20),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
