//! In-process engine used by the `voxhost` binary and by tests.
//!
//! It keeps the engine globals and per-instance settings in memory and
//! generates certificates with [`crate::certificate`]. On SIGINT/SIGTERM it
//! freezes every registered instance's settings into its area and runs the
//! termination hook.

use crate::SERVERS_DIR_NAME;
use crate::certificate;
use crate::engine::{Engine, EngineArgs, EngineInstance};
use crate::error::engine::EngineError;
use crate::registry::InstanceRegistry;

use common::ErrorLocation;
use models::InstanceId;
use models::instance::{ADDRESS_KEY, NO_WEB_SERVER_KEY, PORT_KEY};

use std::collections::BTreeMap;
use std::fs::write;
use std::io::{Error as IoError, Result as IoResult};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use log::{error, info, warn};
use tokio::runtime::Builder as RuntimeBuilder;

/// File an instance's settings are frozen to on termination.
pub const FROZEN_SETTINGS_FILE: &str = "settings.json";

pub type TerminationHook = Box<dyn Fn() + Send + Sync>;

pub struct LocalEngine {
    args: RwLock<EngineArgs>,
    registry: RwLock<Option<InstanceRegistry>>,
    on_terminate: TerminationHook,
}

impl LocalEngine {
    /// Engine whose termination hook exits the process with status 0.
    pub fn new() -> Self {
        Self {
            args: RwLock::new(EngineArgs::default()),
            registry: RwLock::new(None),
            on_terminate: Box::new(|| std::process::exit(0)),
        }
    }

    /// Replace what happens after the servers are frozen on a signal.
    pub fn with_termination_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_terminate = Box::new(hook);
        self
    }

    pub fn registry(&self) -> Option<InstanceRegistry> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Write every registered instance's settings to
    /// `<data_dir>/servers/<id>/settings.json`. Returns how many were written.
    pub fn freeze_all(&self) -> usize {
        let Some(data_dir) = self.args().data_dir else {
            warn!("No data directory configured, nothing to freeze");
            return 0;
        };
        let Some(registry) = self.registry() else {
            warn!("No shared registry installed, nothing to freeze");
            return 0;
        };

        let servers_dir = data_dir.join(SERVERS_DIR_NAME);
        let mut frozen = 0;

        for instance in registry.snapshot() {
            let id = instance.id();
            let path = servers_dir.join(id.to_string()).join(FROZEN_SETTINGS_FILE);

            match freeze_instance(instance.as_ref(), &path) {
                Ok(()) => frozen += 1,
                Err(e) => error!("Unable to freeze server {id} to {}: {e}", path.display()),
            }
        }

        frozen
    }

    fn args_mut(&self) -> RwLockWriteGuard<'_, EngineArgs> {
        self.args.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for LocalEngine {
    fn set_data_dir(&self, path: &Path) {
        self.args_mut().data_dir = Some(path.to_path_buf());
    }

    fn set_log_path(&self, path: &Path) {
        self.args_mut().log_path = Some(path.to_path_buf());
    }

    fn set_certificate_paths(&self, cert_path: &Path, key_path: &Path) {
        let mut args = self.args_mut();
        args.cert_path = Some(cert_path.to_path_buf());
        args.key_path = Some(key_path.to_path_buf());
    }

    fn args(&self) -> EngineArgs {
        self.args
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_shared_registry(&self, registry: InstanceRegistry) {
        *self.registry.write().unwrap_or_else(PoisonError::into_inner) = Some(registry);
    }

    fn new_instance(&self, id: InstanceId) -> Result<Arc<dyn EngineInstance>, EngineError> {
        if let Some(registry) = self.registry()
            && registry.contains(id)
        {
            return Err(EngineError::Construction {
                message: format!("Server {id} already exists"),
                location: ErrorLocation::caller(),
            });
        }

        Ok(Arc::new(LocalInstance::new(id)))
    }

    fn generate_self_signed_certificate(
        &self,
        cert_path: &Path,
        key_path: &Path,
        subject_alt_names: &[String],
    ) -> Result<(), EngineError> {
        certificate::generate(cert_path, key_path, subject_alt_names)?;
        Ok(())
    }

    fn run_signal_listener(&self) {
        match wait_for_signal() {
            Ok(signal) => info!("Caught {signal} signal, freezing servers"),
            Err(e) => {
                error!("Signal listener stopped: {e}");
                return;
            }
        }

        let frozen = self.freeze_all();
        info!("Froze {frozen} servers");

        (self.on_terminate)();
    }
}

/// A server object that only records its configuration.
#[derive(Debug)]
pub struct LocalInstance {
    id: InstanceId,
    settings: RwLock<BTreeMap<String, String>>,
}

impl LocalInstance {
    pub fn new(id: InstanceId) -> Self {
        Self {
            id,
            settings: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn settings(&self) -> BTreeMap<String, String> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EngineInstance for LocalInstance {
    fn id(&self) -> InstanceId {
        self.id
    }

    fn set(&self, key: &str, value: &str) {
        self.settings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn get(&self, key: &str) -> Option<String> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

fn freeze_instance(instance: &dyn EngineInstance, path: &Path) -> IoResult<()> {
    let settings: BTreeMap<&str, String> = [NO_WEB_SERVER_KEY, ADDRESS_KEY, PORT_KEY]
        .into_iter()
        .filter_map(|key| instance.get(key).map(|value| (key, value)))
        .collect();

    let json = serde_json::to_string_pretty(&settings).map_err(IoError::other)?;
    write(path, json)
}

/// Block until SIGINT or, on unix, SIGTERM arrives.
fn wait_for_signal() -> IoResult<&'static str> {
    let runtime = RuntimeBuilder::new_current_thread().enable_all().build()?;
    runtime.block_on(termination_signal())
}

#[cfg(unix)]
async fn termination_signal() -> IoResult<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "interrupt"),
        _ = terminate.recv() => Ok("terminate"),
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> IoResult<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "interrupt")
}
