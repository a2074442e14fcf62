//! Test helpers for host integration tests.
//!
//! - [`RecordingEngine`]: an engine that records every call in order and can be
//!   told to fail at a chosen step
//! - [`scratch_config`]: a host config rooted in a throwaway directory

use host_core::config::HostConfig;
use host_core::engine::local::LocalEngine;
use host_core::engine::{Engine, EngineArgs, EngineInstance};
use host_core::error::certificate::CertificateError;
use host_core::error::engine::EngineError;
use host_core::registry::InstanceRegistry;

use common::ErrorLocation;
use models::InstanceId;

use std::io::Error as IoError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

pub const SET_SHARED_REGISTRY: &str = "set_shared_registry";
pub const SET_DATA_DIR: &str = "set_data_dir";
pub const SET_LOG_PATH: &str = "set_log_path";
pub const GENERATE_CERTIFICATE: &str = "generate_self_signed_certificate";
pub const SET_CERTIFICATE_PATHS: &str = "set_certificate_paths";
pub const NEW_INSTANCE: &str = "new_instance";

/// Engine double that delegates to [`LocalEngine`] and records each call.
#[derive(Default)]
pub struct RecordingEngine {
    inner: LocalEngine,
    calls: Mutex<Vec<&'static str>>,
    listener_runs: AtomicUsize,
    subject_alt_names: Mutex<Vec<String>>,
    block_log_file: Option<String>,
    fail_certificate: bool,
    reject_ids: Vec<i64>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory with this name in the data dir, so the log file
    /// cannot be opened.
    pub fn with_blocked_log_file(mut self, name: impl Into<String>) -> Self {
        self.block_log_file = Some(name.into());
        self
    }

    pub fn with_failing_certificate(mut self) -> Self {
        self.fail_certificate = true;
        self
    }

    /// Refuse to build these ids.
    pub fn with_reject_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.reject_ids = ids.into_iter().collect();
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn listener_runs(&self) -> usize {
        self.listener_runs.load(Ordering::SeqCst)
    }

    /// Names the last certificate was requested for.
    pub fn subject_alt_names(&self) -> Vec<String> {
        self.subject_alt_names.lock().unwrap().clone()
    }

    pub fn shared_registry(&self) -> Option<InstanceRegistry> {
        self.inner.registry()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Engine for RecordingEngine {
    fn set_data_dir(&self, path: &Path) {
        self.record(SET_DATA_DIR);
        if let Some(name) = &self.block_log_file {
            std::fs::create_dir(path.join(name)).unwrap();
        }
        self.inner.set_data_dir(path);
    }

    fn set_log_path(&self, path: &Path) {
        self.record(SET_LOG_PATH);
        self.inner.set_log_path(path);
    }

    fn set_certificate_paths(&self, cert_path: &Path, key_path: &Path) {
        self.record(SET_CERTIFICATE_PATHS);
        self.inner.set_certificate_paths(cert_path, key_path);
    }

    fn args(&self) -> EngineArgs {
        self.inner.args()
    }

    fn set_shared_registry(&self, registry: InstanceRegistry) {
        self.record(SET_SHARED_REGISTRY);
        self.inner.set_shared_registry(registry);
    }

    fn new_instance(&self, id: InstanceId) -> Result<Arc<dyn EngineInstance>, EngineError> {
        self.record(NEW_INSTANCE);
        if self.reject_ids.contains(&id.get()) {
            return Err(EngineError::Construction {
                message: format!("Rejected server {id}"),
                location: ErrorLocation::caller(),
            });
        }
        self.inner.new_instance(id)
    }

    fn generate_self_signed_certificate(
        &self,
        cert_path: &Path,
        key_path: &Path,
        subject_alt_names: &[String],
    ) -> Result<(), EngineError> {
        self.record(GENERATE_CERTIFICATE);
        *self.subject_alt_names.lock().unwrap() = subject_alt_names.to_vec();
        if self.fail_certificate {
            return Err(EngineError::Certificate(CertificateError::Io {
                path: cert_path.to_path_buf(),
                location: ErrorLocation::caller(),
                source: IoError::other("disk full"),
            }));
        }
        self.inner
            .generate_self_signed_certificate(cert_path, key_path, subject_alt_names)
    }

    fn run_signal_listener(&self) {
        self.listener_runs.fetch_add(1, Ordering::SeqCst);
    }
}

/// Config whose data area lives under `base`.
pub fn scratch_config(base: &TempDir) -> HostConfig {
    let mut config = HostConfig::default();
    config.data_area.base_dir = Some(base.path().to_path_buf());
    config.data_area.prefix = "voxhost-it".to_string();
    config
}

/// Entries directly under `dir`, for checking nothing was left behind.
pub fn entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    entries.sort();
    entries
}
