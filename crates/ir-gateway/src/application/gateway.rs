//! The gateway aggregate and its per-tick loop.
//!
//! One [`Gateway`] owns every collaborator: the message bus, the IR
//! transceiver, the presence manager and the backoff clock.  There is no
//! global state; everything the loop touches is reachable from `self`.
//!
//! Each [`Gateway::tick`] runs, in order:
//!
//! 1. the presence manager's connect sequence, if the bus is down (this may
//!    wait through any number of backoffs before returning);
//! 2. one bus I/O service call, handling every inbound command;
//! 3. a drain of the transceiver, publishing each decoded frame to the event
//!    topic.

use ir_gateway_core::{decode_command, encode_frame, IrFrame, MalformedCommand};
use tracing::{debug, error, info, warn};

use crate::application::bus::{InboundMessage, MessageBus, QoS};
use crate::application::presence::{Clock, PresenceManager};
use crate::application::transmit::{IrTransceiver, TransceiverError, TransmitGuard};
use crate::domain::GatewayConfig;

/// What happened to one inbound command.
#[derive(Debug)]
pub enum CommandOutcome {
    /// The frame was handed to the transceiver and sent.
    Sent(IrFrame),
    /// The payload did not decode; nothing was sent.
    Rejected(MalformedCommand),
    /// The payload decoded but the transceiver failed to send it.
    Failed(TransceiverError),
}

/// Counters for one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Backoff waits spent reconnecting before the tick could proceed.
    pub backoffs: u32,
    pub events_published: u32,
    /// Frames received but not delivered (publish failed or bus down).
    pub events_lost: u32,
    pub commands_sent: u32,
    pub commands_rejected: u32,
    pub commands_failed: u32,
}

/// Bridges one IR transceiver and one message bus.
pub struct Gateway<B: MessageBus, T: IrTransceiver> {
    bus: B,
    transceiver: T,
    presence: PresenceManager,
    clock: Box<dyn Clock>,
}

impl<B: MessageBus, T: IrTransceiver> Gateway<B, T> {
    pub fn new(config: &GatewayConfig, bus: B, transceiver: T, clock: Box<dyn Clock>) -> Self {
        Self {
            bus,
            transceiver,
            presence: PresenceManager::new(config),
            clock,
        }
    }

    pub fn presence(&self) -> &PresenceManager {
        &self.presence
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn transceiver(&self) -> &T {
        &self.transceiver
    }

    pub fn transceiver_mut(&mut self) -> &mut T {
        &mut self.transceiver
    }

    /// Runs one iteration of the loop.
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport {
            backoffs: self
                .presence
                .ensure_connected(&mut self.bus, self.clock.as_ref())
                .await,
            ..TickReport::default()
        };

        match self.bus.service_io().await {
            Ok(messages) => {
                for message in messages {
                    if message.topic != self.presence.topics().command() {
                        debug!(topic = %message.topic, "ignoring message on foreign topic");
                        continue;
                    }
                    match self.handle_command(&message) {
                        CommandOutcome::Sent(_) => report.commands_sent += 1,
                        CommandOutcome::Rejected(_) => report.commands_rejected += 1,
                        CommandOutcome::Failed(_) => report.commands_failed += 1,
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "bus I/O failed");
                self.presence.observe(&self.bus);
            }
        }

        self.drain_frames(&mut report).await;
        report
    }

    /// Decodes and transmits one inbound command.
    ///
    /// The receiver is disabled for exactly the duration of the send, and
    /// re-enabled even when the send fails.
    pub fn handle_command(&mut self, message: &InboundMessage) -> CommandOutcome {
        let frame = match decode_command(&message.payload) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(
                    error = %e,
                    payload = %String::from_utf8_lossy(&message.payload),
                    "discarding malformed command"
                );
                return CommandOutcome::Rejected(e);
            }
        };

        let mut guard = TransmitGuard::acquire(&mut self.transceiver);
        let result = guard.send(&frame);
        drop(guard);

        match result {
            Ok(()) => {
                info!(
                    protocol = %frame.protocol,
                    value = %format!("{:X}", frame.value),
                    bits = frame.bit_length,
                    "transmitted IR command"
                );
                CommandOutcome::Sent(frame)
            }
            Err(e) => {
                error!(error = %e, protocol = %frame.protocol, "IR transmission failed");
                CommandOutcome::Failed(e)
            }
        }
    }

    /// Loops forever.  Only returns by being dropped (see `main`).
    pub async fn run(&mut self) {
        loop {
            let report = self.tick().await;
            if report != TickReport::default() {
                debug!(?report, "tick");
            }
            tokio::task::yield_now().await;
        }
    }

    /// Announces the gateway offline and closes the bus connection.
    pub async fn shutdown(&mut self) {
        match self.presence.go_offline(&mut self.bus).await {
            Ok(()) => info!("gateway offline"),
            Err(e) => warn!(error = %e, "unclean shutdown; broker will publish the last will"),
        }
    }

    async fn drain_frames(&mut self, report: &mut TickReport) {
        while let Some(frame) = self.transceiver.try_receive() {
            if self.publish_frame(&frame).await {
                report.events_published += 1;
            } else {
                report.events_lost += 1;
            }
            self.transceiver.resume();
        }
    }

    async fn publish_frame(&mut self, frame: &IrFrame) -> bool {
        let json = match encode_frame(frame).to_json() {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "failed to serialise IR event");
                return false;
            }
        };

        if !self.presence.state().is_connected() {
            warn!(event = %json, "bus down; IR event dropped");
            return false;
        }

        let topic = self.presence.topics().event().to_string();
        match self
            .bus
            .publish(&topic, json.as_bytes(), QoS::AtMostOnce, false)
            .await
        {
            Ok(()) => {
                debug!(topic = %topic, event = %json, "published IR event");
                true
            }
            Err(e) => {
                warn!(error = %e, event = %json, "failed to publish IR event");
                self.presence.observe(&self.bus);
                false
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
