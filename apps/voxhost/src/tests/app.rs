// Unit tests for the app entry point

use crate::app::{load_config, run_with};
use crate::error::AppError;

use host_core::config::HostConfig;
use host_core::engine::local::LocalEngine;
use host_core::error::config::ConfigError;
use host_core::error::host::HostError;
use host_core::host::is_host_active;

use std::fs::{read_dir, write};
use std::sync::Arc;
use std::sync::mpsc::channel;

use serial_test::serial;
use tempfile::{TempDir, tempdir};

fn scratch_config(base: &TempDir) -> HostConfig {
    let mut config = HostConfig::default();
    config.data_area.base_dir = Some(base.path().to_path_buf());
    config.data_area.prefix = String::from("voxhost-app");
    config
}

fn is_empty(dir: &TempDir) -> bool {
    read_dir(dir.path()).unwrap().next().is_none()
}

/// **VALUE**: Tests that no config path means the built-in defaults.
#[test]
fn given_no_path_when_loading_config_then_defaults() {
    let config = load_config(None).unwrap();

    assert_eq!(config, HostConfig::default());
}

/// **VALUE**: Tests that a configured file is read, including its ports.
#[test]
fn given_config_file_when_loading_then_ports_read() {
    // GIVEN: A config file with two ports
    let dir = tempdir().unwrap();
    let path = dir.path().join("voxhost.toml");
    write(&path, "ports = [\"64738\", \"64739\"]\n").unwrap();

    // WHEN: Loading it
    let config = load_config(Some(path.as_path())).unwrap();

    // THEN: Ports come from the file, everything else is default
    assert_eq!(config.ports, vec!["64738", "64739"]);
    assert_eq!(config.logging, HostConfig::default().logging);
}

#[test]
fn given_broken_config_file_when_loading_then_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("voxhost.toml");
    write(&path, "ports = [").unwrap();

    let result = load_config(Some(path.as_path()));

    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::ParseError { .. }))
    ));
}

/// **VALUE**: Tests that a termination notification shuts the host down cleanly.
///
/// **WHY THIS MATTERS**: The binary's only way out of its wait is this
/// notification. If shutdown were skipped the data area would stay on disk.
#[test]
#[serial]
fn given_termination_notified_when_running_then_host_shut_down() {
    // GIVEN: No ports, so no listener thread, and a termination already sent
    let base = tempdir().unwrap();
    let (notify, terminated) = channel();
    notify.send(()).unwrap();

    // WHEN: Running
    let result = run_with(Arc::new(LocalEngine::new()), scratch_config(&base), terminated);

    // THEN: Clean exit and nothing left behind
    assert!(result.is_ok(), "Run failed: {result:?}");
    assert!(is_empty(&base));
    assert!(!is_host_active());
}

/// **VALUE**: Tests that a bad configured port still shuts the host down.
///
/// **BUG THIS CATCHES**: Would catch an early return on the server error that
/// skips shutdown and leaks the data area and the host guard.
#[test]
#[serial]
fn given_invalid_port_when_running_then_error_and_host_shut_down() {
    let base = tempdir().unwrap();
    let mut config = scratch_config(&base);
    config.ports = vec![String::from("not-a-port")];
    let (_notify, terminated) = channel();

    let result = run_with(Arc::new(LocalEngine::new()), config, terminated);

    assert!(matches!(
        result,
        Err(AppError::Host(HostError::InvalidSettings(_)))
    ));
    assert!(is_empty(&base));
    assert!(!is_host_active());
}

/// **VALUE**: Tests that a dropped notifier ends the wait with an error instead of
/// hanging, and still shuts down.
#[test]
#[serial]
fn given_notifier_dropped_when_running_then_signal_error() {
    let base = tempdir().unwrap();
    let (notify, terminated) = channel::<()>();
    drop(notify);

    let result = run_with(Arc::new(LocalEngine::new()), scratch_config(&base), terminated);

    assert!(matches!(result, Err(AppError::Signal { .. })));
    assert!(is_empty(&base));
}
