pub mod builder;

use std::fmt::{Display, Formatter, Result as FormatResult};

/// Engine setting that disables the embedded web server.
pub const NO_WEB_SERVER_KEY: &str = "NoWebServer";

/// Engine setting holding the listen address.
pub const ADDRESS_KEY: &str = "Address";

/// Engine setting holding the listen port.
pub const PORT_KEY: &str = "Port";

/// Identifier of one hosted server instance.
///
/// Ids are positive, handed out in increasing order and never reused
/// within a host, even after the instance is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(i64);

impl InstanceId {
    pub const FIRST: InstanceId = InstanceId(1);

    /// Returns `None` for zero and negative values.
    pub const fn new(value: i64) -> Option<Self> {
        if value > 0 { Some(Self(value)) } else { None }
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// The id that follows this one.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for InstanceId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.0)
    }
}

/// Settings applied to an instance at creation.
///
/// Write-once: the host applies them before the instance is registered and
/// offers no update path afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSettings {
    pub no_web_server: bool,
    pub address: String,
    pub port: String,
}

impl InstanceSettings {
    /// Key/value pairs in the order they are handed to the engine.
    pub fn entries(&self) -> [(&'static str, String); 3] {
        [
            (NO_WEB_SERVER_KEY, self.no_web_server.to_string()),
            (ADDRESS_KEY, self.address.clone()),
            (PORT_KEY, self.port.clone()),
        ]
    }
}
