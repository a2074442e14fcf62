use crate::error::config::ConfigError;
use crate::error::data_area::DataAreaError;
use crate::error::engine::EngineError;
use crate::error::log_sink::LogSinkError;
use crate::host::HostStatus;

use common::ErrorLocation;
use models::{InstanceId, ModelError};

use thiserror::Error as ThisError;

/// Everything the public host surface can return.
#[derive(Debug, ThisError)]
pub enum HostError {
    /// Another host already owns the engine's process-wide state.
    #[error("Host Already Running Error: a host is already active in this process {location}")]
    AlreadyRunning { location: ErrorLocation },

    #[error("Host Not Ready Error: cannot {operation} while {status:?} {location}")]
    NotReady {
        operation: &'static str,
        status: HostStatus,
        location: ErrorLocation,
    },

    #[error("Unknown Instance Error: no registered server with id {id} {location}")]
    UnknownInstance {
        id: InstanceId,
        location: ErrorLocation,
    },

    #[error(transparent)]
    InvalidSettings(#[from] ModelError),

    #[error(transparent)]
    DataArea(#[from] DataAreaError),

    #[error(transparent)]
    LogSink(#[from] LogSinkError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
