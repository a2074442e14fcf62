//! Self-signed certificate generation for the engine's TLS listener.

use crate::error::certificate::CertificateError;

use common::ErrorLocation;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

const COMMON_NAME: &str = "voxhost autogenerated certificate";
const ORGANIZATION_NAME: &str = "voxhost";
const CERT_FILE_MODE: u32 = 0o644;
const KEY_FILE_MODE: u32 = 0o600;

/// Paths of a certificate and key written by [`generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedIdentity {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Generate a self-signed certificate and its private key and write both as
/// PEM. The key file is readable by the owner only.
///
/// # Errors
///
/// - [`CertificateError::Crypto`] if key or certificate generation fails
/// - [`CertificateError::Io`] if either file cannot be written
pub fn generate(
    cert_path: &Path,
    key_path: &Path,
    subject_alt_names: &[String],
) -> Result<GeneratedIdentity, CertificateError> {
    let mut params =
        CertificateParams::new(subject_alt_names.to_vec()).map_err(|e| CertificateError::Crypto {
            message: format!("Invalid subject alternative names {subject_alt_names:?}"),
            location: ErrorLocation::caller(),
            source: e,
        })?;

    let mut dn = DistinguishedName::new();
    dn.push(DnType::OrganizationName, ORGANIZATION_NAME);
    dn.push(DnType::CommonName, COMMON_NAME);
    params.distinguished_name = dn;

    let key_pair = KeyPair::generate().map_err(|e| CertificateError::Crypto {
        message: "Failed to generate key pair".to_string(),
        location: ErrorLocation::caller(),
        source: e,
    })?;

    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| CertificateError::Crypto {
            message: "Failed to self-sign certificate".to_string(),
            location: ErrorLocation::caller(),
            source: e,
        })?;

    write_pem(cert_path, &cert.pem(), CERT_FILE_MODE)?;
    write_pem(key_path, &key_pair.serialize_pem(), KEY_FILE_MODE)?;

    info!("Certificate output to {}", cert_path.display());
    info!("Private key output to {}", key_path.display());

    Ok(GeneratedIdentity {
        cert_path: cert_path.to_path_buf(),
        key_path: key_path.to_path_buf(),
    })
}

#[track_caller]
fn write_pem(path: &Path, pem: &str, mode: u32) -> Result<(), CertificateError> {
    let location = ErrorLocation::caller();
    let to_error = |e| CertificateError::Io {
        path: path.to_path_buf(),
        location,
        source: e,
    };

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options.open(path).map_err(to_error)?;
    file.write_all(pem.as_bytes()).map_err(to_error)?;
    file.sync_all().map_err(to_error)
}
