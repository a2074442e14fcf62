//! Standalone entry point: one host, one server per configured port, kept
//! alive until the process is told to terminate.

use crate::error::AppError;

use host_core::config::HostConfig;
use host_core::engine::Engine;
use host_core::engine::local::LocalEngine;
use host_core::host::{Host, InstanceHandle};

use common::ErrorLocation;

use std::env::var_os;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};

use log::{info, warn};

/// Environment variable naming the TOML config file.
pub const CONFIG_ENV: &str = "VOXHOST_CONFIG";

/// Load `.env`, read the config and serve until SIGINT/SIGTERM.
pub fn run() -> Result<(), AppError> {
    load_env()?;

    let config = load_config(var_os(CONFIG_ENV).map(PathBuf::from).as_deref())?;

    let (notify, terminated) = channel();
    let engine = LocalEngine::new().with_termination_hook(move || {
        if notify.send(()).is_err() {
            warn!("Termination requested but nobody is waiting for it");
        }
    });

    run_with(Arc::new(engine), config, terminated)
}

/// Serve `config.ports` on `engine` until `terminated` fires, then shut down.
///
/// The host is shut down whether or not the servers came up.
pub fn run_with(
    engine: Arc<dyn Engine>,
    config: HostConfig,
    terminated: Receiver<()>,
) -> Result<(), AppError> {
    let mut host = Host::create_with(engine, config)?;

    let served = start_servers(&mut host).and_then(|handles| {
        info!("Serving {} servers, waiting for termination", handles.len());
        terminated.recv().map_err(|e| AppError::Signal {
            message: format!("Termination channel closed: {e}"),
            location: ErrorLocation::caller(),
        })
    });

    let shutdown = host.shutdown();
    served?;
    shutdown?;
    Ok(())
}

/// Config from `path`, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<HostConfig, AppError> {
    match path {
        Some(path) => Ok(HostConfig::load(path)?),
        None => Ok(HostConfig::default()),
    }
}

fn load_env() -> Result<(), AppError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(AppError::Environment {
            message: format!("Failed to load .env: {e}"),
            location: ErrorLocation::caller(),
        }),
    }
}

fn start_servers(host: &mut Host) -> Result<Vec<InstanceHandle>, AppError> {
    let ports = host.config().ports.clone();
    if ports.is_empty() {
        warn!("No ports configured, no servers will be started");
    }

    ports
        .into_iter()
        .map(|port| host.create_server(port).map_err(AppError::from))
        .collect()
}
