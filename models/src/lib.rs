//! Domain models for voxhost.
//!
//! Plain data passed between the host layer and the engine boundary.
//! No filesystem or engine access happens here.
//!
//! ## Architecture
//!
//! - **models** (this crate): instance ids and instance settings
//! - **host-core**: lifecycle, data area, logging, certificates, engine trait
//! - **voxhost**: binary wiring everything together

pub mod error;
pub mod instance;

pub use common::ErrorLocation;
pub use error::model_error::ModelError;
pub use instance::builder::InstanceSettingsBuilder;
pub use instance::{InstanceId, InstanceSettings};

#[cfg(test)]
mod tests;
