//! CLI command implementations for supago.

pub mod pull;
pub mod server;
