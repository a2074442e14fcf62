use crate::helpers::{
    GENERATE_CERTIFICATE, RecordingEngine, SET_CERTIFICATE_PATHS, SET_DATA_DIR, SET_LOG_PATH,
    SET_SHARED_REGISTRY, entries, scratch_config,
};

use host_core::engine::Engine;
use host_core::error::certificate::CertificateError;
use host_core::error::data_area::DataAreaError;
use host_core::error::engine::EngineError;
use host_core::error::host::HostError;
use host_core::error::log_sink::LogSinkError;
use host_core::host::{Host, HostStatus, is_host_active};

use std::sync::Arc;

use serial_test::serial;
use tempfile::tempdir;

// ============================================================================
// Host::create_with() initialization sequence
// ============================================================================

/// **VALUE**: Verifies the four initialization steps run once each, in order.
///
/// **WHY THIS MATTERS**: The engine reads its globals as they are set. Generating
/// the certificate before the data dir exists, or installing the registry after
/// the engine starts resolving ids, breaks the engine in ways the host never sees.
#[test]
#[serial]
fn given_healthy_engine_when_creating_host_then_steps_run_once_in_order() {
    // GIVEN: A recording engine and a scratch base dir
    let base = tempdir().unwrap();
    let engine = Arc::new(RecordingEngine::new());

    // WHEN: Creating the host
    let mut host = Host::create_with(engine.clone(), scratch_config(&base)).unwrap();

    // THEN: Each step ran exactly once, in order
    assert_eq!(
        engine.calls(),
        vec![
            SET_SHARED_REGISTRY,
            SET_DATA_DIR,
            SET_LOG_PATH,
            GENERATE_CERTIFICATE,
            SET_CERTIFICATE_PATHS,
        ]
    );
    assert_eq!(host.status(), HostStatus::Ready);

    // AND: The engine's globals point into the host's data area
    let args = engine.args();
    assert_eq!(args.data_dir.as_deref(), Some(host.data_dir()));
    assert_eq!(args.log_path.as_deref(), Some(host.log_path()));
    let (cert, key) = host.certificate_paths();
    assert_eq!(args.cert_path.as_deref(), Some(cert));
    assert_eq!(args.key_path.as_deref(), Some(key));
    assert!(cert.is_file() && key.is_file());

    // AND: The engine holds the host's registry, not a copy
    assert!(engine.shared_registry().unwrap().same_map(host.registry()));

    host.shutdown().unwrap();
}

/// **VALUE**: Verifies the configured subject alternative names reach whatever
/// engine the host runs on, not only the built-in one.
#[test]
#[serial]
fn given_custom_subject_alt_names_when_creating_host_then_engine_receives_them() {
    // GIVEN: A config naming its own certificate hosts
    let base = tempdir().unwrap();
    let mut config = scratch_config(&base);
    config.certificate.subject_alt_names = vec![
        "voice.example.org".to_string(),
        "10.0.0.5".to_string(),
    ];
    let engine = Arc::new(RecordingEngine::new());

    // WHEN: Creating the host on a caller-supplied engine
    let mut host = Host::create_with(engine.clone(), config).unwrap();

    // THEN: The certificate was requested for exactly those names
    assert_eq!(
        engine.subject_alt_names(),
        vec!["voice.example.org".to_string(), "10.0.0.5".to_string()]
    );

    host.shutdown().unwrap();
}

/// **VALUE**: Verifies the log file carries the startup banner and the data dir.
#[test]
#[serial]
fn given_created_host_when_reading_log_then_banner_and_data_dir_present() {
    let base = tempdir().unwrap();
    let mut host = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();

    let log = std::fs::read_to_string(host.log_path()).unwrap();

    assert!(log.contains("voxhost "), "missing banner in: {log}");
    assert!(
        log.contains(&format!("Using data directory: {}", host.data_dir().display())),
        "missing data dir in: {log}"
    );
    assert!(log.lines().all(|line| line.starts_with("[V] ")), "log: {log}");

    host.shutdown().unwrap();
}

/// **VALUE**: Verifies that a data area failure (step 2) stops initialization there.
#[test]
#[serial]
fn given_missing_base_dir_when_creating_host_then_stops_after_registry_step() {
    // GIVEN: A base dir that does not exist
    let base = tempdir().unwrap();
    let mut config = scratch_config(&base);
    config.data_area.base_dir = Some(base.path().join("gone"));
    let engine = Arc::new(RecordingEngine::new());

    // WHEN: Creating the host
    let result = Host::create_with(engine.clone(), config);

    // THEN: The data area error surfaces and later steps never ran
    assert!(matches!(
        result,
        Err(HostError::DataArea(DataAreaError::Create { .. }))
    ));
    assert_eq!(engine.calls(), vec![SET_SHARED_REGISTRY]);
    assert!(!is_host_active(), "Failed start must release the host guard");
}

/// **VALUE**: Verifies that a log file failure (step 3) stops initialization and
/// removes the data area created in step 2.
///
/// **BUG THIS CATCHES**: Would catch certificate generation still running after
/// logging failed, or a half-built data area left in the temp dir.
#[test]
#[serial]
fn given_unopenable_log_file_when_creating_host_then_stops_before_certificates() {
    // GIVEN: An engine that puts a directory where the log file goes
    let base = tempdir().unwrap();
    let engine = Arc::new(RecordingEngine::new().with_blocked_log_file("voxhost.log"));

    // WHEN: Creating the host
    let result = Host::create_with(engine.clone(), scratch_config(&base));

    // THEN: The log error surfaces unchanged
    assert!(matches!(
        result,
        Err(HostError::LogSink(LogSinkError::Open { .. }))
    ));

    // AND: Nothing after the data dir step ran, and the data area is gone
    assert_eq!(engine.calls(), vec![SET_SHARED_REGISTRY, SET_DATA_DIR]);
    assert!(entries(base.path()).is_empty(), "data area should be removed");
    assert!(!is_host_active());
}

/// **VALUE**: Verifies that a certificate failure (step 4) surfaces unchanged and the
/// engine never gets certificate paths.
#[test]
#[serial]
fn given_failing_certificate_when_creating_host_then_error_surfaces_and_area_removed() {
    let base = tempdir().unwrap();
    let engine = Arc::new(RecordingEngine::new().with_failing_certificate());

    let result = Host::create_with(engine.clone(), scratch_config(&base));

    match result {
        Err(HostError::Engine(EngineError::Certificate(CertificateError::Io { source, .. }))) => {
            assert_eq!(source.to_string(), "disk full");
        }
        Err(other) => panic!("Expected certificate error, got {other:?}"),
        Ok(_) => panic!("Expected certificate error, got a host"),
    }
    assert_eq!(
        engine.calls(),
        vec![
            SET_SHARED_REGISTRY,
            SET_DATA_DIR,
            SET_LOG_PATH,
            GENERATE_CERTIFICATE
        ]
    );
    assert!(engine.args().cert_path.is_none());
    assert!(entries(base.path()).is_empty());
}

/// **VALUE**: Verifies that an invalid config is rejected before the engine is touched.
#[test]
#[serial]
fn given_invalid_config_when_creating_host_then_engine_untouched() {
    let base = tempdir().unwrap();
    let mut config = scratch_config(&base);
    config.logging.level = "chatty".to_string();
    let engine = Arc::new(RecordingEngine::new());

    let result = Host::create_with(engine.clone(), config);

    assert!(matches!(result, Err(HostError::Config(_))));
    assert!(engine.calls().is_empty());
}

// ============================================================================
// Process-wide singleton
// ============================================================================

/// **VALUE**: Verifies that a second host cannot be created while one is live.
///
/// **WHY THIS MATTERS**: A second host would overwrite the engine's data dir, log
/// target and certificate paths under the first host's running servers.
#[test]
#[serial]
fn given_live_host_when_creating_second_then_returns_already_running() {
    // GIVEN: A live host
    let base = tempdir().unwrap();
    let mut first = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    let second_engine = Arc::new(RecordingEngine::new());

    // WHEN: Creating another
    let second = Host::create_with(second_engine.clone(), scratch_config(&base));

    // THEN: Refused, and the second engine was never touched
    assert!(matches!(second, Err(HostError::AlreadyRunning { .. })));
    assert!(second_engine.calls().is_empty());

    // AND: After shutdown a new host can be created
    first.shutdown().unwrap();
    let mut third = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    third.shutdown().unwrap();
}

/// **VALUE**: Verifies that dropping a host without shutdown releases the guard.
#[test]
#[serial]
fn given_dropped_host_when_creating_again_then_succeeds() {
    let base = tempdir().unwrap();
    let host = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    let leftover = host.data_dir().to_path_buf();
    drop(host);

    assert!(!is_host_active());
    let mut next = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    next.shutdown().unwrap();

    // Dropping does not remove the data area; only shutdown does
    assert!(leftover.exists());
}
