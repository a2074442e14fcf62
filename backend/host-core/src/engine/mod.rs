//! Boundary toward the voice server engine.
//!
//! The engine keeps process-global configuration (data dir, log path,
//! certificate paths) and a shared instance map. The host only ever talks to
//! it through [`Engine`], so the globals have exactly one owner.

pub mod local;

use crate::error::engine::EngineError;
use crate::registry::InstanceRegistry;

use models::InstanceId;

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Process-global settings the engine reads at start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineArgs {
    pub data_dir: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

/// One server object built by the engine.
pub trait EngineInstance: Send + Sync {
    fn id(&self) -> InstanceId;

    /// Apply one configuration setting.
    fn set(&self, key: &str, value: &str);

    fn get(&self, key: &str) -> Option<String>;
}

pub trait Engine: Send + Sync {
    fn set_data_dir(&self, path: &Path);

    fn set_log_path(&self, path: &Path);

    fn set_certificate_paths(&self, cert_path: &Path, key_path: &Path);

    /// Snapshot of the globals set so far.
    fn args(&self) -> EngineArgs;

    /// Hand the engine the map it resolves instance ids against.
    fn set_shared_registry(&self, registry: InstanceRegistry);

    /// Build a server bound to `id`. The instance is not registered.
    fn new_instance(&self, id: InstanceId) -> Result<Arc<dyn EngineInstance>, EngineError>;

    /// Write a self-signed certificate valid for `subject_alt_names`.
    fn generate_self_signed_certificate(
        &self,
        cert_path: &Path,
        key_path: &Path,
        subject_alt_names: &[String],
    ) -> Result<(), EngineError>;

    /// Blocks until the process is asked to terminate and reacts to it.
    /// Runs on its own thread for the life of the process.
    fn run_signal_listener(&self);
}
