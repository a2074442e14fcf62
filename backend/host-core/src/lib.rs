//! Instance lifecycle and shared-state isolation for an in-process voice
//! server engine.
//!
//! The engine behind [`engine::Engine`] assumes it owns the process: one data
//! directory, one log target, one certificate. [`host::Host`] sets that shared
//! state up once and then hands out any number of isolated server instances.

pub mod certificate;
pub mod config;
pub mod data_area;
pub mod engine;
pub mod error;
pub mod host;
pub mod log_sink;
pub mod registry;

#[cfg(test)]
mod tests;

pub const DEFAULT_INSTANCE_ADDRESS: &str = "127.0.0.1";
pub const SERVERS_DIR_NAME: &str = "servers";
