use common::ErrorLocation;

use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum CertificateError {
    #[error("Crypto Error: {message} {location}")]
    Crypto {
        message: String,
        location: ErrorLocation,
        #[source]
        source: rcgen::Error,
    },

    #[error("Certificate Write Error: {path}: {source} {location}")]
    Io {
        path: PathBuf,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },
}
