//! Domain layer for the gateway binary.
//!
//! Holds the validated runtime configuration.  The IR frame model and the
//! topic layout live in `ir-gateway-core`; this layer only adds what the
//! running process needs on top of them.
//!
//! Nothing here performs I/O: the infrastructure layer reads the TOML file
//! and the CLI, then hands a finished [`GatewayConfig`] to the application.

pub mod config;

pub use config::{Credentials, GatewayConfig};
