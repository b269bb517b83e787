//! Infrastructure layer for the gateway.
//!
//! Contains the adapters behind the application-layer traits.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `ir_gateway_core`, but MUST NOT be imported by them outside of tests.
//!
//! # Sub-modules
//!
//! - **`bus`** – [`MessageBus`](crate::application::MessageBus) over MQTT
//!   (`rumqttc`), plus a recording `MockBus` for tests.
//!
//! - **`transceiver`** – [`IrTransceiver`](crate::application::IrTransceiver)
//!   backends: `DryRunTransceiver` for running without hardware, and the
//!   scriptable `MockTransceiver` for tests.
//!
//! - **`storage`** – TOML configuration file loading and validation.
//!
//! - **`clock`** – the tokio-backed [`Clock`](crate::application::Clock) and a
//!   recording clock for tests.

pub mod bus;
pub mod clock;
pub mod storage;
pub mod transceiver;
