use crate::error::model_error::ModelError;
use crate::{ErrorLocation, InstanceSettings};

use std::net::IpAddr;

/// Builder for validated [`InstanceSettings`].
///
/// The port stays a string because that is what the engine consumes, but it
/// must parse as a non-zero `u16`.
#[derive(Debug, Default)]
pub struct InstanceSettingsBuilder {
    no_web_server: Option<bool>,
    address: Option<String>,
    port: Option<String>,
}

impl InstanceSettingsBuilder {
    pub fn with_no_web_server(mut self, no_web_server: bool) -> Self {
        self.no_web_server = Some(no_web_server);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Build the settings with validation.
    #[track_caller]
    pub fn build(self) -> Result<InstanceSettings, ModelError> {
        let no_web_server = self.no_web_server.ok_or_else(|| ModelError::Validation {
            message: String::from("NoWebServer flag is required"),
            location: ErrorLocation::caller(),
        })?;

        let address = self.address.ok_or_else(|| ModelError::Validation {
            message: String::from("Address is required"),
            location: ErrorLocation::caller(),
        })?;

        if address.parse::<IpAddr>().is_err() {
            return Err(ModelError::Validation {
                message: format!("Address is not an IP address: '{address}'"),
                location: ErrorLocation::caller(),
            });
        }

        let port = self.port.ok_or_else(|| ModelError::Validation {
            message: String::from("Port is required"),
            location: ErrorLocation::caller(),
        })?;

        match port.parse::<u16>() {
            Ok(0) => {
                return Err(ModelError::Validation {
                    message: String::from("Port must be non-zero"),
                    location: ErrorLocation::caller(),
                });
            }
            Ok(_) => {}
            Err(e) => {
                return Err(ModelError::Validation {
                    message: format!("Invalid port '{port}': {e}"),
                    location: ErrorLocation::caller(),
                });
            }
        }

        Ok(InstanceSettings {
            no_web_server,
            address,
            port,
        })
    }
}
