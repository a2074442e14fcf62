use crate::helpers::{NEW_INSTANCE, RecordingEngine, entries, scratch_config};

use host_core::error::data_area::DataAreaError;
use host_core::error::engine::EngineError;
use host_core::error::host::HostError;
use host_core::host::Host;

use models::instance::{ADDRESS_KEY, NO_WEB_SERVER_KEY, PORT_KEY};
use models::{InstanceId, ModelError};

use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

use serial_test::serial;
use tempfile::tempdir;

const LISTENER_WAIT: Duration = Duration::from_secs(5);

fn wait_for_listener(engine: &RecordingEngine) -> usize {
    let deadline = Instant::now() + LISTENER_WAIT;
    while engine.listener_runs() == 0 && Instant::now() < deadline {
        sleep(Duration::from_millis(10));
    }
    engine.listener_runs()
}

// ============================================================================
// Id allocation
// ============================================================================

/// **VALUE**: Verifies ids increase by one and are never reused after a destroy.
///
/// **BUG THIS CATCHES**: Would catch ids computed from the registry size, which
/// hands out a live server's id again after an earlier one is destroyed.
#[test]
#[serial]
fn given_interleaved_destroys_when_creating_servers_then_ids_never_reused() {
    // GIVEN: A host
    let base = tempdir().unwrap();
    let mut host = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();

    // WHEN: Creating and destroying in a mixed order
    let one = host.create_server("64738").unwrap();
    let two = host.create_server("64739").unwrap();
    host.destroy_server(&one).unwrap();
    let three = host.create_server("64740").unwrap();
    host.destroy_server(&three).unwrap();
    let four = host.create_server("64741").unwrap();

    // THEN: Ids follow creation order only
    let ids: Vec<i64> = [&one, &two, &three, &four]
        .iter()
        .map(|handle| handle.id().get())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(host.registry().ids(), vec![two.id(), four.id()]);

    // AND: Only the live servers keep a directory
    assert_eq!(
        entries(host.servers_dir()),
        vec![host.servers_dir().join("2"), host.servers_dir().join("4")]
    );

    host.shutdown().unwrap();
}

/// **VALUE**: Verifies a server's directory is named after its id.
#[test]
#[serial]
fn given_created_server_when_checking_area_then_named_after_id() {
    let base = tempdir().unwrap();
    let mut host = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();

    let handle = host.create_server("64738").unwrap();

    assert_eq!(handle.area(), host.servers_dir().join("1"));
    assert!(handle.area().is_dir());
    assert_eq!(host.servers_dir(), host.data_dir().join("servers"));

    host.shutdown().unwrap();
}

// ============================================================================
// Default settings
// ============================================================================

/// **VALUE**: Verifies each new server gets the default settings before anyone
/// can look it up.
///
/// **WHY THIS MATTERS**: The engine resolves servers through the shared
/// registry. A server visible there without its port would start on whatever
/// port the engine defaults to.
#[test]
#[serial]
fn given_new_server_when_reading_settings_then_defaults_and_port_applied() {
    // GIVEN: A host on the recording engine
    let base = tempdir().unwrap();
    let engine = Arc::new(RecordingEngine::new());
    let mut host = Host::create_with(engine.clone(), scratch_config(&base)).unwrap();

    // WHEN: Creating a server
    let handle = host.create_server("64738").unwrap();

    // THEN: The engine sees the server through the shared registry, configured
    let instance = engine.shared_registry().unwrap().get(handle.id()).unwrap();
    assert_eq!(instance.get(NO_WEB_SERVER_KEY).as_deref(), Some("true"));
    assert_eq!(instance.get(ADDRESS_KEY).as_deref(), Some("127.0.0.1"));
    assert_eq!(instance.get(PORT_KEY).as_deref(), Some("64738"));

    // AND: The handle reports the same settings
    assert_eq!(handle.port(), "64738");
    assert!(handle.settings().no_web_server);
    assert_eq!(handle.settings().address, "127.0.0.1");

    host.shutdown().unwrap();
}

/// **VALUE**: Verifies configured instance defaults replace the built-in ones.
#[test]
#[serial]
fn given_custom_defaults_when_creating_server_then_custom_values_applied() {
    let base = tempdir().unwrap();
    let mut config = scratch_config(&base);
    config.instance_defaults.address = "0.0.0.0".to_string();
    config.instance_defaults.no_web_server = false;
    let mut host = Host::create_with(Arc::new(RecordingEngine::new()), config).unwrap();

    let handle = host.create_server("64738").unwrap();

    assert_eq!(handle.instance().get(ADDRESS_KEY).as_deref(), Some("0.0.0.0"));
    assert_eq!(handle.instance().get(NO_WEB_SERVER_KEY).as_deref(), Some("false"));

    host.shutdown().unwrap();
}

// ============================================================================
// Signal listener
// ============================================================================

/// **VALUE**: Verifies the signal listener starts with the first server and never
/// again.
///
/// **BUG THIS CATCHES**: Would catch one listener thread per server, each of
/// which would freeze and terminate on the same signal.
#[test]
#[serial]
fn given_many_servers_when_created_then_listener_launched_once() {
    // GIVEN: A fresh host has no listener
    let base = tempdir().unwrap();
    let engine = Arc::new(RecordingEngine::new());
    let mut host = Host::create_with(engine.clone(), scratch_config(&base)).unwrap();
    assert!(!host.is_started());
    assert_eq!(host.listener_launches(), 0);

    // WHEN: Creating several servers, with a destroy in between
    let first = host.create_server("64738").unwrap();
    host.destroy_server(&first).unwrap();
    host.create_server("64739").unwrap();
    host.create_server("64740").unwrap();

    // THEN: Exactly one listener was launched and it ran
    assert!(host.is_started());
    assert_eq!(host.listener_launches(), 1);
    assert_eq!(wait_for_listener(&engine), 1);

    host.shutdown().unwrap();
}

/// **VALUE**: Verifies a failed create does not start the listener.
#[test]
#[serial]
fn given_failed_first_create_when_checking_listener_then_not_started() {
    let base = tempdir().unwrap();
    let mut host = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();

    let result = host.create_server("not-a-port");

    assert!(result.is_err());
    assert!(!host.is_started());
    assert_eq!(host.listener_launches(), 0);

    host.shutdown().unwrap();
}

// ============================================================================
// Failed creation leaves nothing behind
// ============================================================================

/// **VALUE**: Verifies an invalid port is rejected before the engine builds anything.
#[test]
#[serial]
fn given_invalid_port_when_creating_server_then_invalid_settings_and_id_kept() {
    // GIVEN: A host
    let base = tempdir().unwrap();
    let engine = Arc::new(RecordingEngine::new());
    let mut host = Host::create_with(engine.clone(), scratch_config(&base)).unwrap();

    // WHEN: Creating with ports that cannot be bound
    for port in ["", "0", "65536", "port"] {
        let result = host.create_server(port);

        // THEN: Rejected as invalid settings
        assert!(
            matches!(result, Err(HostError::InvalidSettings(ModelError::Validation { .. }))),
            "Port '{port}' should be rejected, got {result:?}"
        );
    }

    // AND: The engine was never asked, nothing was created, and id 1 is still free
    assert!(!engine.calls().contains(&NEW_INSTANCE));
    assert!(entries(host.servers_dir()).is_empty());
    assert_eq!(host.create_server("64738").unwrap().id(), InstanceId::FIRST);

    host.shutdown().unwrap();
}

/// **VALUE**: Verifies an engine refusal registers nothing and does not consume the id.
#[test]
#[serial]
fn given_engine_rejects_id_when_creating_server_then_nothing_registered() {
    // GIVEN: An engine that refuses to build server 2
    let base = tempdir().unwrap();
    let engine = Arc::new(RecordingEngine::new().with_reject_ids([2]));
    let mut host = Host::create_with(engine.clone(), scratch_config(&base)).unwrap();
    host.create_server("64738").unwrap();

    // WHEN: Creating the second server, twice
    let first_try = host.create_server("64739");
    let second_try = host.create_server("64739");

    // THEN: Both attempts asked for id 2, because the failed one did not consume it
    for attempt in [first_try, second_try] {
        match attempt {
            Err(HostError::Engine(EngineError::Construction { message, .. })) => {
                assert_eq!(message, "Rejected server 2");
            }
            other => panic!("Expected construction error, got {other:?}"),
        }
    }

    // AND: Only server 1 exists anywhere
    assert_eq!(host.server_count(), 1);
    assert_eq!(entries(host.servers_dir()), vec![host.servers_dir().join("1")]);

    host.shutdown().unwrap();
}

/// **VALUE**: Verifies a directory collision registers nothing and keeps the id.
///
/// **BUG THIS CATCHES**: Would catch a server registered before its directory
/// exists, leaving the engine with an instance whose area is someone else's.
#[test]
#[serial]
fn given_existing_area_when_creating_server_then_collision_and_retry_reuses_id() {
    // GIVEN: A stray directory where server 1 would live
    let base = tempdir().unwrap();
    let mut host = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    let stray = host.servers_dir().join("1");
    std::fs::create_dir(&stray).unwrap();

    // WHEN: Creating a server
    let result = host.create_server("64738");

    // THEN: Collision, and nothing registered
    assert!(matches!(
        result,
        Err(HostError::DataArea(DataAreaError::Collision { .. }))
    ));
    assert_eq!(host.server_count(), 0);
    assert!(!host.is_started());

    // AND: Once the stray directory is gone, id 1 is handed out
    std::fs::remove_dir(&stray).unwrap();
    assert_eq!(host.create_server("64738").unwrap().id(), InstanceId::FIRST);

    host.shutdown().unwrap();
}

// ============================================================================
// Destroy
// ============================================================================

/// **VALUE**: Verifies destroy deregisters the server and removes its directory.
#[test]
#[serial]
fn given_live_server_when_destroyed_then_deregistered_and_area_removed() {
    let base = tempdir().unwrap();
    let engine = Arc::new(RecordingEngine::new());
    let mut host = Host::create_with(engine.clone(), scratch_config(&base)).unwrap();
    let handle = host.create_server("64738").unwrap();
    std::fs::write(handle.area().join("murmur.sqlite"), b"data").unwrap();

    host.destroy_server(&handle).unwrap();

    assert!(!handle.area().exists());
    assert!(host.server(handle.id()).is_none());
    assert!(!engine.shared_registry().unwrap().contains(handle.id()));

    host.shutdown().unwrap();
}

/// **VALUE**: Verifies destroying the same server twice is reported, not ignored.
#[test]
#[serial]
fn given_destroyed_server_when_destroyed_again_then_unknown_instance() {
    let base = tempdir().unwrap();
    let mut host = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    let handle = host.create_server("64738").unwrap();
    let neighbour = host.create_server("64739").unwrap();

    host.destroy_server(&handle).unwrap();
    let again = host.destroy_server(&handle);

    match again {
        Err(HostError::UnknownInstance { id, .. }) => assert_eq!(id, handle.id()),
        other => panic!("Expected UnknownInstance, got {other:?}"),
    }

    // The neighbouring server is untouched
    assert!(host.server(neighbour.id()).is_some());
    assert!(neighbour.area().is_dir());

    host.shutdown().unwrap();
}

/// **VALUE**: Verifies a handle kept from an earlier host cannot destroy a server
/// of the current one.
///
/// **BUG THIS CATCHES**: Ids restart at 1 for every host. Destroying by id alone
/// would remove the new host's server 1 and its directory through the old handle.
#[test]
#[serial]
fn given_handle_from_previous_host_when_destroying_then_unknown_and_server_kept() {
    // GIVEN: A handle left over from a host that was shut down
    let base = tempdir().unwrap();
    let mut previous = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    let stale = previous.create_server("64738").unwrap();
    previous.shutdown().unwrap();

    // AND: A new host whose first server reuses the same id
    let mut host = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    let live = host.create_server("64739").unwrap();
    assert_eq!(live.id(), stale.id());

    // WHEN: Destroying through the stale handle
    let result = host.destroy_server(&stale);

    // THEN: Refused, and the live server keeps its registration and directory
    assert!(matches!(result, Err(HostError::UnknownInstance { .. })));
    assert!(host.server(live.id()).is_some());
    assert!(live.area().is_dir());

    // AND: The owning handle still destroys it
    host.destroy_server(&live).unwrap();
    assert!(host.server(live.id()).is_none());

    host.shutdown().unwrap();
}
