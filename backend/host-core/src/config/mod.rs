use crate::error::config::ConfigError;
use crate::DEFAULT_INSTANCE_ADDRESS;

use common::ErrorLocation;

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use log::{LevelFilter, info, warn};
use serde::{Deserialize, Serialize};

// ============================================
// CONFIG STRUCTS
// ============================================

/// Where the private working tree is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataAreaConfig {
    /// Parent of the temp root. `None` means the system temp directory.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for DataAreaConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            prefix: default_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file_name")]
    pub file_name: String,
    /// Fixed tag written at the start of every line.
    #[serde(default = "default_log_prefix")]
    pub prefix: String,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_name: default_log_file_name(),
            prefix: default_log_prefix(),
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateConfig {
    #[serde(default = "default_cert_file")]
    pub cert_file: String,
    #[serde(default = "default_key_file")]
    pub key_file: String,
    #[serde(default = "default_subject_alt_names")]
    pub subject_alt_names: Vec<String>,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            cert_file: default_cert_file(),
            key_file: default_key_file(),
            subject_alt_names: default_subject_alt_names(),
        }
    }
}

/// Settings every new instance starts with, apart from its port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceDefaults {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_no_web_server")]
    pub no_web_server: bool,
}

impl Default for InstanceDefaults {
    fn default() -> Self {
        Self {
            address: default_address(),
            no_web_server: default_no_web_server(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostConfig {
    #[serde(default)]
    pub data_area: DataAreaConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub certificate: CertificateConfig,

    #[serde(default)]
    pub instance_defaults: InstanceDefaults,

    /// Ports the binary opens a server on at start.
    #[serde(default)]
    pub ports: Vec<String>,
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_prefix() -> String {
    "voxhost".to_string()
}
fn default_log_file_name() -> String {
    "voxhost.log".to_string()
}
fn default_log_prefix() -> String {
    "[V] ".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_cert_file() -> String {
    "cert.pem".to_string()
}
fn default_key_file() -> String {
    "key.pem".to_string()
}
fn default_subject_alt_names() -> Vec<String> {
    vec!["localhost".to_string(), DEFAULT_INSTANCE_ADDRESS.to_string()]
}
fn default_address() -> String {
    DEFAULT_INSTANCE_ADDRESS.to_string()
}
fn default_no_web_server() -> bool {
    true
}

// ============================================
// IMPLEMENTATION
// ============================================

impl HostConfig {
    /// Load config from a TOML file.
    ///
    /// A missing file yields the defaults. A file that exists but cannot be
    /// read, parsed or validated is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            location: ErrorLocation::caller(),
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: HostConfig = toml::from_str(&contents).map_err(|e| {
            warn!("Failed to parse host config {}: {}", path.display(), e);
            ConfigError::ParseError {
                location: ErrorLocation::caller(),
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_area.prefix.is_empty() {
            return Err(validation("data_area.prefix cannot be empty"));
        }

        for (field, value) in [
            ("logging.file_name", &self.logging.file_name),
            ("certificate.cert_file", &self.certificate.cert_file),
            ("certificate.key_file", &self.certificate.key_file),
        ] {
            if !is_plain_file_name(value) {
                return Err(validation(format!(
                    "{field} must be a plain file name, got '{value}'"
                )));
            }
        }

        if self.certificate.cert_file == self.certificate.key_file {
            return Err(validation("certificate.cert_file and key_file must differ"));
        }

        self.level_filter()?;

        if self.certificate.subject_alt_names.is_empty() {
            return Err(validation("certificate.subject_alt_names cannot be empty"));
        }

        if self.instance_defaults.address.parse::<IpAddr>().is_err() {
            return Err(validation(format!(
                "instance_defaults.address is not an IP address: '{}'",
                self.instance_defaults.address
            )));
        }

        Ok(())
    }

    /// Parsed `logging.level`.
    #[track_caller]
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.logging
            .level
            .parse::<LevelFilter>()
            .map_err(|_| validation(format!("Unknown log level '{}'", self.logging.level)))
    }
}

#[track_caller]
fn validation(reason: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        location: ErrorLocation::caller(),
        reason: reason.into(),
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}
