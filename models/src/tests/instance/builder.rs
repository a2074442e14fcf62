use crate::instance::{ADDRESS_KEY, NO_WEB_SERVER_KEY, PORT_KEY};
use crate::{InstanceSettingsBuilder, ModelError};

fn defaults() -> InstanceSettingsBuilder {
    InstanceSettingsBuilder::default()
        .with_no_web_server(true)
        .with_address("127.0.0.1")
}

/// **VALUE**: Verifies the happy path produces the three engine settings in order.
///
/// **BUG THIS CATCHES**: Would catch a renamed key or a reordering that changes
/// what the engine sees when the host applies settings.
#[test]
fn given_valid_fields_when_building_then_entries_match_engine_keys() {
    // GIVEN: Loopback defaults and a port
    let builder = defaults().with_port("64738");

    // WHEN: Building
    let settings = builder.build().unwrap();

    // THEN: Entries are the engine's keys with stringified values
    let entries = settings.entries();
    assert_eq!(entries[0], (NO_WEB_SERVER_KEY, "true".to_string()));
    assert_eq!(entries[1], (ADDRESS_KEY, "127.0.0.1".to_string()));
    assert_eq!(entries[2], (PORT_KEY, "64738".to_string()));
}

/// **VALUE**: Verifies that a missing port is rejected instead of defaulting.
#[test]
fn given_missing_port_when_building_then_returns_validation_error() {
    // GIVEN: Builder without a port
    let builder = defaults();

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Validation error names the port
    match result.unwrap_err() {
        ModelError::Validation { message, .. } => assert_eq!(message, "Port is required"),
    }
}

/// **VALUE**: Verifies that non-numeric, zero and out-of-range ports are rejected.
///
/// **BUG THIS CATCHES**: Would catch if validation is loosened and the engine gets
/// handed a port it cannot bind, failing much later and far from the caller.
#[test]
fn given_invalid_ports_when_building_then_each_is_rejected() {
    for port in ["", "abc", "0", "65536", "-1", "64738 "] {
        let result = defaults().with_port(port).build();
        assert!(result.is_err(), "Port '{port}' should be rejected");
    }
}

/// **VALUE**: Verifies that the address must be an IP literal.
#[test]
fn given_hostname_address_when_building_then_returns_validation_error() {
    // GIVEN: A hostname instead of an IP
    let builder = InstanceSettingsBuilder::default()
        .with_no_web_server(true)
        .with_address("localhost")
        .with_port("64738");

    // WHEN/THEN: Build fails with a message that quotes the address
    let err = builder.build().unwrap_err();
    assert!(err.to_string().contains("'localhost'"));
}

/// **VALUE**: Verifies that validation errors carry the builder caller's location.
#[test]
fn given_validation_error_when_formatted_then_includes_location() {
    let err = defaults().with_port("0").build().unwrap_err();

    let error_string = err.to_string();
    assert!(error_string.contains("Validation Error"));
    assert!(error_string.contains("Port must be non-zero"));
    assert!(error_string.contains("builder.rs"));
}
