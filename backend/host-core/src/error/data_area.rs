use common::ErrorLocation;

use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum DataAreaError {
    #[error("Data Area Create Error: {message}: {path}: {source} {location}")]
    Create {
        message: String,
        path: PathBuf,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Data Area Collision Error: {path} already exists {location}")]
    Collision {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Data Area Remove Error: {message}: {path}: {source} {location}")]
    Remove {
        message: String,
        path: PathBuf,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },
}
