// Unit tests for HostConfig loading and validation

use crate::config::HostConfig;
use crate::error::config::ConfigError;

use log::LevelFilter;
use tempfile::tempdir;

/// **VALUE**: Verifies that a missing config file falls back to defaults.
///
/// **WHY THIS MATTERS**: The binary runs without any config file by default.
/// If a missing file became an error, a fresh install would refuse to start.
#[test]
fn given_missing_file_when_loading_then_returns_defaults() {
    // GIVEN: A directory without a config file
    let dir = tempdir().unwrap();

    // WHEN: Loading
    let config = HostConfig::load(&dir.path().join("voxhost.toml")).unwrap();

    // THEN: Defaults are used
    assert_eq!(config, HostConfig::default());
    assert_eq!(config.instance_defaults.address, "127.0.0.1");
    assert!(config.instance_defaults.no_web_server);
    assert_eq!(config.logging.file_name, "voxhost.log");
}

/// **VALUE**: Verifies that partial TOML files merge with defaults.
#[test]
fn given_partial_toml_when_loading_then_unset_fields_use_defaults() {
    // GIVEN: Only a prefix, a level and two ports
    let dir = tempdir().unwrap();
    let path = dir.path().join("voxhost.toml");
    std::fs::write(
        &path,
        r#"
ports = ["64738", "64739"]

[data_area]
prefix = "tonio"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    // WHEN: Loading
    let config = HostConfig::load(&path).unwrap();

    // THEN: Set values are kept, the rest are defaults
    assert_eq!(config.data_area.prefix, "tonio");
    assert_eq!(config.ports, vec!["64738", "64739"]);
    assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);
    assert_eq!(config.certificate.cert_file, "cert.pem");
    assert_eq!(config.logging.prefix, "[V] ");
}

/// **VALUE**: Verifies that malformed TOML is reported as a parse error, not defaults.
///
/// **BUG THIS CATCHES**: Would catch a fallback that silently ignores a broken file
/// and starts the host with settings the operator did not ask for.
#[test]
fn given_invalid_toml_when_loading_then_returns_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("voxhost.toml");
    std::fs::write(&path, "ports = [64738").unwrap();

    let result = HostConfig::load(&path);

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

/// **VALUE**: Verifies that file names with path separators are rejected.
///
/// **BUG THIS CATCHES**: A log or key file name like `../key.pem` would place
/// files outside the private data area, where teardown never removes them.
#[test]
fn given_file_name_with_separator_when_validating_then_returns_error() {
    let mut config = HostConfig::default();
    config.certificate.key_file = "../key.pem".to_string();

    let err = config.validate().unwrap_err();

    match err {
        ConfigError::ValidationError { reason, .. } => {
            assert!(reason.contains("certificate.key_file"), "got: {reason}");
        }
        other => panic!("Expected ValidationError, got {other:?}"),
    }
}

/// **VALUE**: Verifies the remaining validation rules each reject their bad value.
#[test]
fn given_invalid_values_when_validating_then_each_is_rejected() {
    let cases: Vec<(&str, Box<dyn Fn(&mut HostConfig)>)> = vec![
        ("empty prefix", Box::new(|c| c.data_area.prefix.clear())),
        ("unknown level", Box::new(|c| c.logging.level = "loud".into())),
        (
            "same cert and key",
            Box::new(|c| c.certificate.key_file = c.certificate.cert_file.clone()),
        ),
        (
            "no SANs",
            Box::new(|c| c.certificate.subject_alt_names.clear()),
        ),
        (
            "hostname address",
            Box::new(|c| c.instance_defaults.address = "localhost".into()),
        ),
        ("dot log file", Box::new(|c| c.logging.file_name = "..".into())),
    ];

    for (name, mutate) in cases {
        let mut config = HostConfig::default();
        mutate(&mut config);
        assert!(config.validate().is_err(), "Case '{name}' should fail validation");
    }
}
