//! Presence manager: connection state machine, retained presence message and
//! reconnect backoff.
//!
//! # Presence protocol
//!
//! Observers learn whether the gateway is reachable from the retained
//! `T/online` topic:
//!
//! 1. Every connect registers `T/online = "false"` (QoS 1, retained) as the
//!    last will, *as part of the handshake*.
//! 2. Right after the handshake the gateway publishes `T/online = "true"`
//!    (QoS 1, retained) and subscribes to `T/command`.
//! 3. If the device drops off the network, the broker publishes the last
//!    will and observers see `"false"`.  The gateway itself publishes nothing
//!    when it notices a lost connection.
//!
//! # Backoff
//!
//! A failed handshake is retried after a fixed wait, forever.  The wait goes
//! through a [`Clock`] so tests can count backoffs without sleeping, and it
//! suspends the whole gateway: no IR frames or commands are processed until
//! the connection is back.

use std::time::Duration;

use async_trait::async_trait;
use ir_gateway_core::{ConnectionState, Topics, OFFLINE_PAYLOAD, ONLINE_PAYLOAD};
use tracing::{debug, info, warn};

use crate::application::bus::{BusError, ConnectOptions, LastWill, MessageBus, QoS};
use crate::domain::GatewayConfig;

/// Source of delays for the reconnect backoff.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspends the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Owns the [`ConnectionState`] and the derived topic names.
#[derive(Debug)]
pub struct PresenceManager {
    state: ConnectionState,
    topics: Topics,
    options: ConnectOptions,
    backoff: Duration,
}

impl PresenceManager {
    /// Builds a manager in the `Disconnected` state from the runtime config.
    pub fn new(config: &GatewayConfig) -> Self {
        let topics = config.topics();
        let options = ConnectOptions {
            client_id: config.device_id.clone(),
            credentials: config.credentials.clone(),
            keep_alive: config.keep_alive,
            last_will: LastWill {
                topic: topics.online().to_string(),
                payload: OFFLINE_PAYLOAD.to_string(),
                qos: QoS::AtLeastOnce,
                retain: true,
            },
        };

        Self {
            state: ConnectionState::Disconnected,
            topics,
            options,
            backoff: config.reconnect_backoff,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Options passed to every connect, including the last will.
    pub fn connect_options(&self) -> &ConnectOptions {
        &self.options
    }

    /// Drops to `Disconnected` if the bus reports its transport gone.
    pub fn observe<B: MessageBus + ?Sized>(&mut self, bus: &B) {
        if self.state.is_connected() && !bus.is_connected() {
            warn!("lost connection to broker; broker will publish the last will");
            self.transition(ConnectionState::Disconnected);
        }
    }

    /// Returns once the gateway is `Connected`, retrying failed handshakes
    /// after the fixed backoff for as long as it takes.
    ///
    /// Returns the number of backoff waits that were needed (zero when the
    /// connection was already up or the first attempt succeeded).
    pub async fn ensure_connected<B: MessageBus + ?Sized>(
        &mut self,
        bus: &mut B,
        clock: &dyn Clock,
    ) -> u32 {
        self.observe(bus);

        let mut backoffs = 0;
        while !self.state.is_connected() {
            match self.handshake(bus).await {
                Ok(()) => {
                    info!(
                        client_id = %self.options.client_id,
                        command_topic = %self.topics.command(),
                        "connected to broker"
                    );
                }
                Err(e) => {
                    warn!(error = %e, backoff = ?self.backoff, "broker connect failed; retrying");
                    clock.sleep(self.backoff).await;
                    backoffs += 1;
                }
            }
        }
        backoffs
    }

    /// Publishes `"false"` to the presence topic and disconnects cleanly.
    ///
    /// A clean disconnect suppresses the last will, so on a deliberate
    /// shutdown the offline state has to be published explicitly.
    pub async fn go_offline<B: MessageBus + ?Sized>(&mut self, bus: &mut B) -> Result<(), BusError> {
        if !self.state.is_connected() {
            debug!("shutdown while disconnected; the last will covers presence");
            return Ok(());
        }

        let published = bus
            .publish(
                self.topics.online(),
                OFFLINE_PAYLOAD.as_bytes(),
                QoS::AtLeastOnce,
                true,
            )
            .await;
        let disconnected = bus.disconnect().await;
        self.transition(ConnectionState::Disconnected);

        published?;
        disconnected
    }

    /// One connect attempt: handshake with last will, presence publish,
    /// command subscription.
    async fn handshake<B: MessageBus + ?Sized>(&mut self, bus: &mut B) -> Result<(), BusError> {
        self.transition(ConnectionState::Connecting);

        if let Err(e) = bus.connect(&self.options).await {
            self.transition(ConnectionState::Disconnected);
            return Err(e);
        }

        // The last will still covers presence if this publish is lost.
        if let Err(e) = bus
            .publish(
                self.topics.online(),
                ONLINE_PAYLOAD.as_bytes(),
                QoS::AtLeastOnce,
                true,
            )
            .await
        {
            warn!(error = %e, "failed to publish online presence");
        }

        // Without the subscription the gateway would be deaf to commands.
        if let Err(e) = bus.subscribe(self.topics.command(), QoS::AtMostOnce).await {
            self.transition(ConnectionState::Disconnected);
            return Err(e);
        }

        self.transition(ConnectionState::Connected);
        Ok(())
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "connection state change");
            self.state = next;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
