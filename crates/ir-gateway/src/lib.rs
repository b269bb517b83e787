//! ir-gateway library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does ir-gateway do?
//!
//! It bridges an infrared remote-control transceiver and an MQTT broker:
//!
//! 1. Every IR frame the receiver decodes is published as JSON to the base
//!    topic `T`, e.g. `{"protocol":"SONY","data":"A90","bitLength":"12"}`.
//! 2. JSON commands of the same shape arriving on `T/command` are decoded
//!    and transmitted, with the receiver disabled while the LED is firing.
//! 3. Reachability is kept in the retained `T/online` topic: `"true"` after
//!    every connect, `"false"` from the broker's last will when the device
//!    disappears.
//!
//! The frame model and the JSON translation live in `ir_gateway_core`; this
//! crate adds the connection handling and I/O.

/// Domain layer: runtime configuration.
pub mod domain;

/// Application layer: collaborator traits, presence manager, gateway loop.
pub mod application;

/// Infrastructure layer: MQTT, transceiver backends, config storage, clocks.
pub mod infrastructure;
