use common::ErrorLocation;

use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LogSinkError {
    #[error("Log Open Error: {path}: {source} {location}")]
    Open {
        path: PathBuf,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Logger Install Error: {message} {location}")]
    Install {
        message: String,
        location: ErrorLocation,
    },
}
