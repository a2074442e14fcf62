use crate::registry::SharedInstance;

use models::{InstanceId, InstanceSettings};

use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::path::{Path, PathBuf};

/// Caller's view of one created server.
///
/// Does not own the engine object; the registry keeps it alive until the
/// server is destroyed or the host shuts down.
#[derive(Clone)]
pub struct InstanceHandle {
    id: InstanceId,
    instance: SharedInstance,
    area: PathBuf,
    settings: InstanceSettings,
}

impl InstanceHandle {
    pub(crate) fn new(
        id: InstanceId,
        instance: SharedInstance,
        area: PathBuf,
        settings: InstanceSettings,
    ) -> Self {
        Self {
            id,
            instance,
            area,
            settings,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn instance(&self) -> &SharedInstance {
        &self.instance
    }

    /// The instance's directory under `<data_dir>/servers`.
    pub fn area(&self) -> &Path {
        &self.area
    }

    pub fn settings(&self) -> &InstanceSettings {
        &self.settings
    }

    pub fn port(&self) -> &str {
        &self.settings.port
    }
}

impl Debug for InstanceHandle {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter
            .debug_struct("InstanceHandle")
            .field("id", &self.id)
            .field("area", &self.area)
            .field("settings", &self.settings)
            .finish()
    }
}
