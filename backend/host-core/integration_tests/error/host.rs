use crate::helpers::{RecordingEngine, scratch_config};

use host_core::error::config::ConfigError;
use host_core::error::data_area::DataAreaError;
use host_core::error::host::HostError;
use host_core::host::{Host, HostStatus};

use common::ErrorLocation;
use models::{InstanceId, ModelError};

use std::sync::Arc;

use serial_test::serial;
use tempfile::tempdir;

// ============================================================================
// HostError display
// ============================================================================

/// **VALUE**: Verifies host errors name the failing operation and where it was raised.
#[test]
fn given_not_ready_error_when_displayed_then_names_operation_status_and_location() {
    let error = HostError::NotReady {
        operation: "create a server",
        status: HostStatus::Terminated,
        location: ErrorLocation::caller(),
    };

    let message = error.to_string();

    assert!(message.starts_with("Host Not Ready Error: cannot create a server while Terminated ["));
    assert!(message.contains(file!()), "location missing from: {message}");
}

#[test]
fn given_unknown_instance_error_when_displayed_then_includes_id() {
    let error = HostError::UnknownInstance {
        id: InstanceId::new(7).unwrap(),
        location: ErrorLocation::caller(),
    };

    assert!(
        error
            .to_string()
            .starts_with("Unknown Instance Error: no registered server with id 7 [")
    );
}

/// **VALUE**: Verifies wrapped errors keep their own message instead of a generic one.
///
/// **WHY THIS MATTERS**: Callers log the top-level error. If wrapping hid the
/// inner message, a failed start would only say that something failed.
#[test]
fn given_wrapped_errors_when_displayed_then_inner_message_shown() {
    let model = ModelError::Validation {
        message: "Port must be between 1 and 65535".to_string(),
        location: ErrorLocation::caller(),
    };
    let inner = model.to_string();
    let wrapped: HostError = model.into();
    assert_eq!(wrapped.to_string(), inner);

    let config = ConfigError::ValidationError {
        location: ErrorLocation::caller(),
        reason: "bad".to_string(),
    };
    let inner = config.to_string();
    let wrapped: HostError = config.into();
    assert_eq!(wrapped.to_string(), inner);
}

// ============================================================================
// Location tracking through the host surface
// ============================================================================

/// **VALUE**: Verifies errors raised inside the host point at host code, not at
/// a shared helper.
#[test]
#[serial]
fn given_unknown_destroy_when_inspecting_location_then_points_into_host() {
    let base = tempdir().unwrap();
    let mut host = Host::create_with(Arc::new(RecordingEngine::new()), scratch_config(&base)).unwrap();
    let handle = host.create_server("64738").unwrap();
    host.destroy_server(&handle).unwrap();

    let error = host.destroy_server(&handle).unwrap_err();

    match error {
        HostError::UnknownInstance { location, .. } => {
            assert!(location.file.ends_with("host/mod.rs"), "got {}", location.file);
        }
        other => panic!("Expected UnknownInstance, got {other:?}"),
    }

    host.shutdown().unwrap();
}

/// **VALUE**: Verifies a data area error raised during start carries its path.
#[test]
#[serial]
fn given_missing_base_dir_when_creating_host_then_error_names_path() {
    let base = tempdir().unwrap();
    let missing = base.path().join("gone");
    let mut config = scratch_config(&base);
    config.data_area.base_dir = Some(missing.clone());

    let error = match Host::create_with(Arc::new(RecordingEngine::new()), config) {
        Err(error) => error,
        Ok(_) => panic!("Expected data area error"),
    };

    match error {
        HostError::DataArea(DataAreaError::Create { path, .. }) => assert_eq!(path, missing),
        other => panic!("Expected DataArea::Create, got {other:?}"),
    }
}
