//! Host lifecycle: one-time setup of the engine's shared state, then any
//! number of isolated server instances, then a single destructive shutdown.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized -> Initializing -> Ready -> ShuttingDown -> Terminated
//! ```
//!
//! Initialization is a fixed chain of four steps, each fatal on failure:
//!
//! 1. install the shared instance registry into the engine
//! 2. create the data area and point the engine at it
//! 3. open the log file and route logging to it
//! 4. generate the self-signed certificate and point the engine at it
//!
//! Only one host may exist per process because steps 1–4 overwrite engine
//! globals. A second [`Host::create`] fails with
//! [`HostError::AlreadyRunning`] until the first host is shut down or dropped.

mod guard;
mod handle;

pub use guard::is_host_active;
pub use handle::InstanceHandle;

use crate::config::HostConfig;
use crate::data_area::DataArea;
use crate::engine::Engine;
use crate::engine::local::LocalEngine;
use crate::error::engine::EngineError;
use crate::error::host::HostError;
use crate::log_sink::{TARGET, install_logger};
use crate::registry::{InstanceRegistry, SharedInstance};

use guard::ProcessGuard;

use common::ErrorLocation;
use models::{InstanceId, InstanceSettingsBuilder};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::Builder as ThreadBuilder;

use log::{debug, error, info, warn};

const SIGNAL_LISTENER_THREAD: &str = "voxhost-signals";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    Uninitialized,
    Initializing,
    Ready,
    ShuttingDown,
    Terminated,
}

pub struct Host {
    engine: Arc<dyn Engine>,
    config: HostConfig,
    status: HostStatus,
    data_area: DataArea,
    registry: InstanceRegistry,
    log_path: PathBuf,
    cert_path: PathBuf,
    key_path: PathBuf,
    next_id: InstanceId,
    started: bool,
    listener_launches: usize,
    guard: Option<ProcessGuard>,
}

impl Host {
    /// Create a host backed by the in-process engine with default settings.
    pub fn create() -> Result<Self, HostError> {
        Self::create_with_config(HostConfig::default())
    }

    /// Create a host backed by the in-process engine.
    pub fn create_with_config(config: HostConfig) -> Result<Self, HostError> {
        Self::create_with(Arc::new(LocalEngine::new()), config)
    }

    /// Run the four initialization steps against `engine`.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error. Nothing after that step runs.
    /// If the data area was already created it is removed again.
    pub fn create_with(engine: Arc<dyn Engine>, config: HostConfig) -> Result<Self, HostError> {
        config.validate()?;
        let guard = ProcessGuard::acquire()?;

        let mut status = HostStatus::Uninitialized;
        advance(&mut status, HostStatus::Initializing);

        let registry = initialize_shared_objects(engine.as_ref());
        let data_area = initialize_data_directory(engine.as_ref(), &config)?;

        let initialized = initialize_logging(engine.as_ref(), &config, &data_area).and_then(
            |log_path| {
                initialize_certificates(engine.as_ref(), &config, &data_area)
                    .map(|(cert_path, key_path)| (log_path, cert_path, key_path))
            },
        );

        let (log_path, cert_path, key_path) = match initialized {
            Ok(paths) => paths,
            Err(e) => {
                error!("Host initialization failed: {e}");
                TARGET.close();
                if let Err(cleanup) = data_area.teardown() {
                    warn!("Failed to remove data area after failed start: {cleanup}");
                }
                return Err(e);
            }
        };

        advance(&mut status, HostStatus::Ready);

        Ok(Self {
            engine,
            config,
            status,
            data_area,
            registry,
            log_path,
            cert_path,
            key_path,
            next_id: InstanceId::FIRST,
            started: false,
            listener_launches: 0,
            guard: Some(guard),
        })
    }

    /// Create a server listening on `port`.
    ///
    /// The instance gets the next id, its own directory under `servers/`, and
    /// the default settings, in that order, before it is registered. If any
    /// step fails nothing is registered, no directory is left behind and the
    /// id is not consumed.
    pub fn create_server(&mut self, port: impl Into<String>) -> Result<InstanceHandle, HostError> {
        self.ensure_ready("create a server")?;

        let defaults = &self.config.instance_defaults;
        let settings = InstanceSettingsBuilder::default()
            .with_no_web_server(defaults.no_web_server)
            .with_address(defaults.address.as_str())
            .with_port(port)
            .build()?;

        let id = self.next_id;
        let instance = self.engine.new_instance(id)?;
        if instance.id() != id {
            return Err(EngineError::Construction {
                message: format!(
                    "Engine built server {} when asked for {id}",
                    instance.id()
                ),
                location: ErrorLocation::caller(),
            }
            .into());
        }

        let area = self.data_area.allocate_instance_area(id)?;

        for (key, value) in settings.entries() {
            instance.set(key, &value);
        }

        self.registry.insert(id, Arc::clone(&instance));
        self.next_id = id.next();

        info!(
            "Created server {id} on {}:{} in {}",
            settings.address,
            settings.port,
            area.display()
        );

        self.start_listener();

        Ok(InstanceHandle::new(id, instance, area, settings))
    }

    /// Deregister a server and remove its directory.
    ///
    /// The id stays retired. Destroying the same server twice, or destroying
    /// through a handle that was not issued for the registered server, fails
    /// with [`HostError::UnknownInstance`].
    pub fn destroy_server(&mut self, handle: &InstanceHandle) -> Result<(), HostError> {
        self.ensure_ready("destroy a server")?;

        let id = handle.id();
        let Some(instance) = self.registry.remove(id) else {
            return Err(HostError::UnknownInstance {
                id,
                location: ErrorLocation::caller(),
            });
        };

        // Ids restart with every host, so a handle from an earlier host can
        // carry the id of someone else's server.
        if !Arc::ptr_eq(&instance, handle.instance()) {
            self.registry.insert(id, instance);
            warn!("Refusing to destroy server {id} through a handle that does not own it");
            return Err(HostError::UnknownInstance {
                id,
                location: ErrorLocation::caller(),
            });
        }

        if let Err(e) = self.data_area.release_instance_area(id) {
            self.registry.insert(id, instance);
            return Err(e.into());
        }

        info!("Destroyed server {id}");
        Ok(())
    }

    /// Remove the data area and everything under it.
    ///
    /// Running servers are not stopped one by one; they are dropped from the
    /// registry and lose their directories. Calling this again after it
    /// succeeded does nothing. If removing the data area fails the host stays
    /// in `ShuttingDown` and the call may be retried.
    pub fn shutdown(&mut self) -> Result<(), HostError> {
        match self.status {
            HostStatus::Terminated => {
                debug!("Shutdown requested on a terminated host");
                return Ok(());
            }
            HostStatus::Ready => {
                info!(
                    "Shutting down host with {} servers, removing {}",
                    self.registry.len(),
                    self.data_area.root().display()
                );
                advance(&mut self.status, HostStatus::ShuttingDown);
                self.registry.clear();
                TARGET.close();
            }
            HostStatus::ShuttingDown => {}
            HostStatus::Uninitialized | HostStatus::Initializing => {
                return Err(HostError::NotReady {
                    operation: "shut down",
                    status: self.status,
                    location: ErrorLocation::caller(),
                });
            }
        }

        self.data_area.teardown()?;

        advance(&mut self.status, HostStatus::Terminated);
        self.guard = None;
        Ok(())
    }

    pub fn status(&self) -> HostStatus {
        self.status
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        self.data_area.root()
    }

    /// `<data_dir>/servers`
    pub fn servers_dir(&self) -> &Path {
        self.data_area.servers_dir()
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// `(certificate, private key)`
    pub fn certificate_paths(&self) -> (&Path, &Path) {
        (&self.cert_path, &self.key_path)
    }

    /// The map shared with the engine.
    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    pub fn server(&self, id: InstanceId) -> Option<SharedInstance> {
        self.registry.get(id)
    }

    pub fn server_count(&self) -> usize {
        self.registry.len()
    }

    /// Whether the signal listener has been launched.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// How many times a signal listener thread was spawned. Never above 1.
    pub fn listener_launches(&self) -> usize {
        self.listener_launches
    }

    #[track_caller]
    fn ensure_ready(&self, operation: &'static str) -> Result<(), HostError> {
        if self.status == HostStatus::Ready {
            Ok(())
        } else {
            Err(HostError::NotReady {
                operation,
                status: self.status,
                location: ErrorLocation::caller(),
            })
        }
    }

    /// Launch the engine's signal listener on its own thread, once.
    fn start_listener(&mut self) {
        if self.started {
            return;
        }

        let engine = Arc::clone(&self.engine);
        let spawned = ThreadBuilder::new()
            .name(SIGNAL_LISTENER_THREAD.to_string())
            .spawn(move || engine.run_signal_listener());

        match spawned {
            Ok(_) => {
                self.started = true;
                self.listener_launches += 1;
                info!("Signal listener started");
            }
            Err(e) => warn!("Failed to start signal listener, will retry on next server: {e}"),
        }
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        if self.status == HostStatus::Ready {
            warn!(
                "Host dropped without shutdown, data area left at {}",
                self.data_area.root().display()
            );
        }
    }
}

fn advance(status: &mut HostStatus, next: HostStatus) {
    debug!("Host status {status:?} -> {next:?}");
    *status = next;
}

fn initialize_shared_objects(engine: &dyn Engine) -> InstanceRegistry {
    let registry = InstanceRegistry::new();
    engine.set_shared_registry(registry.clone());
    registry
}

fn initialize_data_directory(
    engine: &dyn Engine,
    config: &HostConfig,
) -> Result<DataArea, HostError> {
    let data_area = DataArea::initialize(&config.data_area)?;
    engine.set_data_dir(data_area.root());
    Ok(data_area)
}

fn initialize_logging(
    engine: &dyn Engine,
    config: &HostConfig,
    data_area: &DataArea,
) -> Result<PathBuf, HostError> {
    let log_path = data_area.root().join(&config.logging.file_name);

    TARGET.open_file(&log_path)?;
    install_logger(&config.logging.prefix, config.level_filter()?)?;
    engine.set_log_path(&log_path);

    info!("voxhost {}", env!("CARGO_PKG_VERSION"));
    info!("Using data directory: {}", data_area.root().display());

    Ok(log_path)
}

fn initialize_certificates(
    engine: &dyn Engine,
    config: &HostConfig,
    data_area: &DataArea,
) -> Result<(PathBuf, PathBuf), HostError> {
    info!("Generating self-signed certificate...");

    let cert_path = data_area.root().join(&config.certificate.cert_file);
    let key_path = data_area.root().join(&config.certificate.key_file);

    engine.generate_self_signed_certificate(
        &cert_path,
        &key_path,
        &config.certificate.subject_alt_names,
    )?;
    engine.set_certificate_paths(&cert_path, &key_path);

    Ok((cert_path, key_path))
}
