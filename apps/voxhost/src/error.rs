use common::ErrorLocation;

use host_core::error::config::ConfigError;
use host_core::error::host::HostError;

use thiserror::Error;

/// Errors that stop the `voxhost` binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// `.env` exists but could not be loaded
    #[error("Environment Error: {message} {location}")]
    Environment {
        message: String,
        location: ErrorLocation,
    },

    /// The termination notification can no longer arrive
    #[error("Signal Error: {message} {location}")]
    Signal {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Host(#[from] HostError),
}
