//! Domain types shared by every layer of the gateway.

pub mod connection;
pub mod frame;
pub mod topics;
