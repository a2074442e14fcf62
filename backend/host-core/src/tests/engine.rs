// Unit tests for the in-process engine

use crate::SERVERS_DIR_NAME;
use crate::engine::local::{FROZEN_SETTINGS_FILE, LocalEngine, LocalInstance};
use crate::engine::{Engine, EngineArgs, EngineInstance};
use crate::error::engine::EngineError;
use crate::registry::InstanceRegistry;

use models::InstanceId;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tempfile::tempdir;

fn id(value: i64) -> InstanceId {
    InstanceId::new(value).unwrap()
}

/// **VALUE**: Verifies that the global setters land in the engine's args.
#[test]
fn given_engine_when_setting_globals_then_args_reflect_them() {
    let engine = LocalEngine::new();
    assert_eq!(engine.args(), EngineArgs::default());

    engine.set_data_dir(Path::new("/tmp/voxhost-a"));
    engine.set_log_path(Path::new("/tmp/voxhost-a/voxhost.log"));
    engine.set_certificate_paths(
        Path::new("/tmp/voxhost-a/cert.pem"),
        Path::new("/tmp/voxhost-a/key.pem"),
    );

    let args = engine.args();
    assert_eq!(args.data_dir.as_deref(), Some(Path::new("/tmp/voxhost-a")));
    assert_eq!(
        args.log_path.as_deref(),
        Some(Path::new("/tmp/voxhost-a/voxhost.log"))
    );
    assert_eq!(
        args.cert_path.as_deref(),
        Some(Path::new("/tmp/voxhost-a/cert.pem"))
    );
    assert_eq!(
        args.key_path.as_deref(),
        Some(Path::new("/tmp/voxhost-a/key.pem"))
    );
}

/// **VALUE**: Verifies that the engine refuses to build a second server for a
/// registered id.
///
/// **BUG THIS CATCHES**: Would catch the engine silently replacing a live server,
/// which is what a reused id would do to the shared map.
#[test]
fn given_registered_id_when_building_instance_then_returns_construction_error() {
    // GIVEN: An engine whose shared map already holds id 1
    let engine = LocalEngine::new();
    let registry = InstanceRegistry::new();
    engine.set_shared_registry(registry.clone());
    registry.insert(id(1), Arc::new(LocalInstance::new(id(1))));

    // WHEN: Asking for id 1 and id 2
    let duplicate = engine.new_instance(id(1));
    let fresh = engine.new_instance(id(2));

    // THEN: Only the fresh id is built
    assert!(matches!(duplicate, Err(EngineError::Construction { .. })));
    assert_eq!(fresh.unwrap().id(), id(2));
    assert!(engine.registry().unwrap().same_map(&registry));
}

/// **VALUE**: Verifies instance settings are stored and read back per key.
#[test]
fn given_instance_when_setting_values_then_get_returns_latest() {
    let instance = LocalInstance::new(id(5));

    instance.set("Port", "64738");
    instance.set("Port", "64740");
    instance.set("Address", "127.0.0.1");

    assert_eq!(instance.get("Port").as_deref(), Some("64740"));
    assert_eq!(instance.get("Missing"), None);
    assert_eq!(instance.settings().len(), 2);
}

/// **VALUE**: Verifies that freezing writes each registered server's settings into
/// its own area as JSON.
///
/// **WHY THIS MATTERS**: Freezing is what survives a SIGTERM. A server frozen into
/// the wrong directory would come back with another server's port.
#[test]
fn given_registered_servers_when_freezing_then_settings_json_written_per_area() {
    // GIVEN: A data dir with areas for servers 1 and 2
    let dir = tempdir().unwrap();
    let servers = dir.path().join(SERVERS_DIR_NAME);
    for value in [1, 2] {
        std::fs::create_dir_all(servers.join(value.to_string())).unwrap();
    }

    let engine = LocalEngine::new();
    let registry = InstanceRegistry::new();
    engine.set_shared_registry(registry.clone());
    engine.set_data_dir(dir.path());

    for (value, port) in [(1, "64738"), (2, "64739")] {
        let instance = engine.new_instance(id(value)).unwrap();
        instance.set("NoWebServer", "true");
        instance.set("Address", "127.0.0.1");
        instance.set("Port", port);
        registry.insert(id(value), instance);
    }

    // WHEN: Freezing
    let frozen = engine.freeze_all();

    // THEN: Both areas hold their own settings
    assert_eq!(frozen, 2);
    let second: BTreeMap<String, String> = serde_json::from_str(
        &std::fs::read_to_string(servers.join("2").join(FROZEN_SETTINGS_FILE)).unwrap(),
    )
    .unwrap();
    assert_eq!(second.get("Port").map(String::as_str), Some("64739"));
    assert_eq!(second.get("NoWebServer").map(String::as_str), Some("true"));
}

/// **VALUE**: Verifies that a server without an area is skipped, not fatal.
#[test]
fn given_missing_area_when_freezing_then_other_servers_still_frozen() {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(SERVERS_DIR_NAME).join("1")).unwrap();

    let engine = LocalEngine::new();
    let registry = InstanceRegistry::new();
    engine.set_shared_registry(registry.clone());
    engine.set_data_dir(dir.path());
    registry.insert(id(1), engine.new_instance(id(1)).unwrap());
    registry.insert(id(9), engine.new_instance(id(9)).unwrap());

    assert_eq!(engine.freeze_all(), 1);
}

/// **VALUE**: Verifies that freezing before the engine is configured does nothing.
#[test]
fn given_unconfigured_engine_when_freezing_then_returns_zero() {
    assert_eq!(LocalEngine::new().freeze_all(), 0);
}
