// Unit tests for self-signed certificate generation

use crate::certificate::generate;
use crate::error::certificate::CertificateError;

use tempfile::tempdir;

fn default_names() -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string()]
}

/// **VALUE**: Verifies that both PEM files are written and returned.
///
/// **WHY THIS MATTERS**: The engine reads these two paths to start TLS. A missing
/// or empty file only shows up when the first client connects.
#[test]
fn given_writable_dir_when_generating_then_writes_certificate_and_key() {
    // GIVEN: A scratch directory
    let dir = tempdir().unwrap();
    let cert_path = dir.path().join("cert.pem");
    let key_path = dir.path().join("key.pem");

    // WHEN: Generating
    let identity = generate(&cert_path, &key_path, &default_names()).unwrap();

    // THEN: Both files hold PEM blocks of the right kind
    assert_eq!(identity.cert_path, cert_path);
    assert_eq!(identity.key_path, key_path);
    let cert = std::fs::read_to_string(&cert_path).unwrap();
    let key = std::fs::read_to_string(&key_path).unwrap();
    assert!(cert.contains("BEGIN CERTIFICATE"));
    assert!(key.contains("BEGIN PRIVATE KEY"));
}

/// **VALUE**: Verifies that each call produces a fresh key.
#[test]
fn given_two_generations_when_comparing_keys_then_they_differ() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.key");
    let second = dir.path().join("second.key");

    generate(&dir.path().join("a.pem"), &first, &default_names()).unwrap();
    generate(&dir.path().join("b.pem"), &second, &default_names()).unwrap();

    assert_ne!(
        std::fs::read_to_string(first).unwrap(),
        std::fs::read_to_string(second).unwrap()
    );
}

/// **VALUE**: Verifies that an unwritable destination is an IO error carrying the path.
#[test]
fn given_missing_parent_dir_when_generating_then_returns_io_error() {
    let dir = tempdir().unwrap();
    let cert_path = dir.path().join("missing").join("cert.pem");
    let key_path = dir.path().join("key.pem");

    let result = generate(&cert_path, &key_path, &default_names());

    match result {
        Err(CertificateError::Io { path, .. }) => assert_eq!(path, cert_path),
        other => panic!("Expected Io error, got {other:?}"),
    }
}

/// **VALUE**: Verifies that a name rcgen cannot encode is a crypto error, and
/// nothing is written.
///
/// **BUG THIS CATCHES**: Would catch generation errors being mapped to IO errors,
/// which hides the real cause behind a file path.
#[test]
fn given_non_ascii_dns_name_when_generating_then_returns_crypto_error() {
    let dir = tempdir().unwrap();
    let cert_path = dir.path().join("cert.pem");
    let key_path = dir.path().join("key.pem");

    let result = generate(&cert_path, &key_path, &["bücher.example".to_string()]);

    assert!(matches!(result, Err(CertificateError::Crypto { .. })));
    assert!(!cert_path.exists());
    assert!(!key_path.exists());
}

#[cfg(unix)]
#[test]
fn given_generated_key_when_inspecting_permissions_then_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let key_path = dir.path().join("key.pem");
    generate(&dir.path().join("cert.pem"), &key_path, &default_names()).unwrap();

    let mode = std::fs::metadata(&key_path).unwrap().permissions().mode();
    assert_eq!(mode & 0o077, 0, "Private key must not be group/other readable");
}
