use crate::error::certificate::CertificateError;

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum EngineError {
    /// The engine refused to build an instance for the requested id.
    #[error("Engine Construction Error: {message} {location}")]
    Construction {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Certificate(#[from] CertificateError),
}
