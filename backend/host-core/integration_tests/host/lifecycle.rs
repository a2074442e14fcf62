use crate::helpers::{RecordingEngine, entries, scratch_config};

use host_core::error::host::HostError;
use host_core::host::{Host, HostStatus, is_host_active};
use host_core::log_sink::TARGET;

use models::InstanceId;

use std::sync::Arc;

use serial_test::serial;
use tempfile::tempdir;

/// **VALUE**: Walks the basic hosting scenario end to end.
///
/// Two servers on consecutive ports get ids 1 and 2, each with its own
/// directory. Shutdown removes the whole data area.
#[test]
#[serial]
fn given_two_servers_when_shutting_down_then_data_area_removed() {
    // GIVEN: A host with two servers
    let base = tempdir().unwrap();
    let mut host = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    let data_dir = host.data_dir().to_path_buf();

    let first = host.create_server("64738").unwrap();
    let second = host.create_server("64739").unwrap();

    assert_eq!(first.id().get(), 1);
    assert_eq!(second.id().get(), 2);
    assert!(data_dir.join("servers").join("1").is_dir());
    assert!(data_dir.join("servers").join("2").is_dir());
    assert_eq!(host.server_count(), 2);

    // WHEN: Shutting down
    host.shutdown().unwrap();

    // THEN: The data area is gone and the host is terminated
    assert!(!data_dir.exists());
    assert!(entries(base.path()).is_empty());
    assert_eq!(host.status(), HostStatus::Terminated);
    assert_eq!(host.server_count(), 0);
}

/// **VALUE**: Verifies shutdown is idempotent.
///
/// **BUG THIS CATCHES**: Would catch a second shutdown failing because the data
/// area no longer exists.
#[test]
#[serial]
fn given_terminated_host_when_shutting_down_again_then_ok() {
    let base = tempdir().unwrap();
    let mut host = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();

    host.shutdown().unwrap();
    let second = host.shutdown();

    assert!(second.is_ok(), "Second shutdown failed: {second:?}");
    assert_eq!(host.status(), HostStatus::Terminated);
}

/// **VALUE**: Verifies server operations are refused once the host is terminated.
#[test]
#[serial]
fn given_terminated_host_when_creating_or_destroying_then_not_ready() {
    // GIVEN: A host that had one server, then shut down
    let base = tempdir().unwrap();
    let mut host = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    let handle = host.create_server("64738").unwrap();
    host.shutdown().unwrap();

    // WHEN/THEN: Both operations report the terminated state
    match host.create_server("64739") {
        Err(HostError::NotReady { status, .. }) => assert_eq!(status, HostStatus::Terminated),
        other => panic!("Expected NotReady, got {other:?}"),
    }
    assert!(matches!(
        host.destroy_server(&handle),
        Err(HostError::NotReady {
            status: HostStatus::Terminated,
            ..
        })
    ));
}

/// **VALUE**: Verifies shutdown releases the process-wide resources.
///
/// **WHY THIS MATTERS**: The log target and the host guard outlive any single
/// host. Leaving either held would make the next host in the process fail or
/// write into a deleted file.
#[test]
#[serial]
fn given_shutdown_when_checking_globals_then_guard_and_log_released() {
    let base = tempdir().unwrap();
    let mut host = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    assert!(is_host_active());
    assert_eq!(TARGET.path().as_deref(), Some(host.log_path()));

    host.shutdown().unwrap();

    assert!(!is_host_active());
    assert!(!TARGET.is_open());
}

/// **VALUE**: Verifies shutdown drops live servers without destroying them first.
#[test]
#[serial]
fn given_live_servers_when_shutting_down_then_registry_emptied() {
    let base = tempdir().unwrap();
    let engine = Arc::new(RecordingEngine::new());
    let mut host = Host::create_with(engine.clone(), scratch_config(&base)).unwrap();
    let handle = host.create_server("64738").unwrap();

    host.shutdown().unwrap();

    let shared = engine.shared_registry().unwrap();
    assert!(shared.is_empty(), "Engine still sees servers after shutdown");
    assert!(host.server(handle.id()).is_none());
    assert!(!handle.area().exists());
}

/// **VALUE**: Verifies that ids restart at 1 for a fresh host in the same process.
#[test]
#[serial]
fn given_new_host_after_shutdown_when_creating_server_then_id_restarts() {
    let base = tempdir().unwrap();

    let mut first = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    first.create_server("64738").unwrap();
    first.create_server("64739").unwrap();
    first.shutdown().unwrap();

    let mut second = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    let handle = second.create_server("64738").unwrap();

    assert_eq!(handle.id(), InstanceId::FIRST);
    second.shutdown().unwrap();
}
