//! Private working tree for one host process.
//!
//! Layout:
//!
//! ```text
//! <root>/                 certificate, key, log file
//! <root>/servers/<id>/    one directory per instance
//! ```

use crate::SERVERS_DIR_NAME;
use crate::config::DataAreaConfig;
use crate::error::data_area::DataAreaError;

use common::ErrorLocation;
use models::InstanceId;

use std::fs::{DirBuilder, remove_dir_all};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::Builder as TempDirBuilder;

#[cfg(unix)]
use std::os::unix::fs::DirBuilderExt;

const SERVERS_DIR_MODE: u32 = 0o700;
const INSTANCE_DIR_MODE: u32 = 0o750;

#[derive(Debug)]
pub struct DataArea {
    root: PathBuf,
    servers: PathBuf,
}

impl DataArea {
    /// Create a uniquely named root and its `servers` subdirectory.
    ///
    /// An existing `servers` directory is accepted. On any other failure the
    /// root is removed again before the error is returned.
    pub fn initialize(config: &DataAreaConfig) -> Result<Self, DataAreaError> {
        let mut builder = TempDirBuilder::new();
        builder.prefix(&config.prefix);

        let created = match &config.base_dir {
            Some(base) => builder.tempdir_in(base),
            None => builder.tempdir(),
        };

        let root = created
            .map_err(|e| DataAreaError::Create {
                message: "Failed to create data directory".to_string(),
                path: config
                    .base_dir
                    .clone()
                    .unwrap_or_else(std::env::temp_dir),
                location: ErrorLocation::caller(),
                source: e,
            })?
            .keep();

        let servers = root.join(SERVERS_DIR_NAME);
        if let Err(e) = dir_builder(SERVERS_DIR_MODE).create(&servers) {
            if e.kind() != ErrorKind::AlreadyExists {
                let _ = remove_dir_all(&root);
                return Err(DataAreaError::Create {
                    message: "Failed to create servers directory".to_string(),
                    path: servers,
                    location: ErrorLocation::caller(),
                    source: e,
                });
            }
            debug!("Servers directory already exists: {}", servers.display());
        }

        info!("Data area created at {}", root.display());
        Ok(Self { root, servers })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn servers_dir(&self) -> &Path {
        &self.servers
    }

    /// Directory owned by instance `id`, whether or not it exists yet.
    pub fn instance_dir(&self, id: InstanceId) -> PathBuf {
        self.servers.join(id.to_string())
    }

    /// Create the directory for instance `id`.
    ///
    /// # Errors
    ///
    /// [`DataAreaError::Collision`] if the directory already exists.
    pub fn allocate_instance_area(&self, id: InstanceId) -> Result<PathBuf, DataAreaError> {
        let path = self.instance_dir(id);

        match dir_builder(INSTANCE_DIR_MODE).create(&path) {
            Ok(()) => {
                debug!("Allocated instance area {}", path.display());
                Ok(path)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(DataAreaError::Collision {
                path,
                location: ErrorLocation::caller(),
            }),
            Err(e) => Err(DataAreaError::Create {
                message: format!("Failed to create area for instance {id}"),
                path,
                location: ErrorLocation::caller(),
                source: e,
            }),
        }
    }

    /// Remove the directory for instance `id`. Missing is fine.
    pub fn release_instance_area(&self, id: InstanceId) -> Result<(), DataAreaError> {
        let path = self.instance_dir(id);
        remove_tree(&path, "Failed to remove instance area")?;
        debug!("Released instance area {}", path.display());
        Ok(())
    }

    /// Remove the whole root. Safe to call again after it succeeded.
    pub fn teardown(&self) -> Result<(), DataAreaError> {
        remove_tree(&self.root, "Failed to remove data directory")?;
        info!("Data area removed: {}", self.root.display());
        Ok(())
    }
}

#[track_caller]
fn remove_tree(path: &Path, message: &str) -> Result<(), DataAreaError> {
    match remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Nothing to remove at {}", path.display());
            Ok(())
        }
        Err(e) => Err(DataAreaError::Remove {
            message: message.to_string(),
            path: path.to_path_buf(),
            location: ErrorLocation::caller(),
            source: e,
        }),
    }
}

#[cfg(unix)]
fn dir_builder(mode: u32) -> DirBuilder {
    let mut builder = DirBuilder::new();
    builder.mode(mode);
    builder
}

#[cfg(not(unix))]
fn dir_builder(_mode: u32) -> DirBuilder {
    DirBuilder::new()
}
