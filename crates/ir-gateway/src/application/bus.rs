//! The message-bus port.
//!
//! The gateway talks to MQTT only through [`MessageBus`].  The production
//! implementation wraps `rumqttc`; tests use the recording
//! `infrastructure::bus::mock::MockBus`.
//!
//! Inbound messages are *returned* by [`MessageBus::service_io`] instead of
//! being pushed into a registered callback, so the gateway handles them on
//! its own task, one at a time, in arrival order.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Credentials;

/// MQTT delivery guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QoS {
    /// Fire and forget (QoS 0).
    AtMostOnce,
    /// Acknowledged delivery, duplicates possible (QoS 1).
    AtLeastOnce,
}

/// Message the broker publishes on our behalf if we vanish without a clean
/// disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastWill {
    pub topic: String,
    pub payload: String,
    pub qos: QoS,
    pub retain: bool,
}

/// Everything one connect handshake needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub client_id: String,
    pub credentials: Option<Credentials>,
    pub keep_alive: Duration,
    /// Registered atomically with the connect itself.
    pub last_will: LastWill,
}

/// A message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    /// Convenience constructor used by tests and adapters.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Errors reported by a [`MessageBus`] implementation.
#[derive(Debug, Error)]
pub enum BusError {
    /// The transport could not reach the broker or the handshake broke off.
    #[error("failed to connect to broker at {addr}: {reason}")]
    ConnectFailed { addr: String, reason: String },

    /// The broker answered the handshake with a refusal.
    #[error("broker refused connection: {0}")]
    Refused(String),

    /// The handshake did not finish in time.
    #[error("connect handshake timed out after {0:?}")]
    Timeout(Duration),

    /// An operation needed a live connection and there is none.
    #[error("not connected to broker")]
    NotConnected,

    /// The client rejected a publish or subscribe request.
    #[error("request rejected: {0}")]
    Request(String),

    /// An established connection failed.
    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

/// Connect/publish/subscribe primitives over one persistent bus connection.
#[async_trait]
pub trait MessageBus: Send {
    /// Opens a fresh connection, registering `options.last_will` as part of
    /// the handshake.  Any previous connection is discarded first.
    async fn connect(&mut self, options: &ConnectOptions) -> Result<(), BusError>;

    /// Whether the transport is currently up.
    fn is_connected(&self) -> bool;

    /// Publishes `payload` on `topic`.
    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), BusError>;

    /// Subscribes to `topic`.
    async fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), BusError>;

    /// Drives pending protocol traffic and returns the messages received in
    /// the meantime.  Must be called every tick.
    ///
    /// # Errors
    ///
    /// A transport failure marks the bus disconnected and is reported here.
    async fn service_io(&mut self) -> Result<Vec<InboundMessage>, BusError>;

    /// Closes the connection cleanly.  A clean disconnect suppresses the
    /// last will.
    async fn disconnect(&mut self) -> Result<(), BusError>;
}
