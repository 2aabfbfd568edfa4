// hoist-core/src/version_store.rs
use std::path::{Path, PathBuf};

use hoist_aio::fs::{atomic_write_file, read_to_string};
use hoist_common::error::{HoistError, Result};
use hoist_common::{Config, Version};
use tracing::{debug, warn};

/// The locally installed version, kept in a single plain-text file.
#[derive(Debug, Clone)]
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.version_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or unreadable file means nothing is installed.
    pub fn read(&self) -> Version {
        if !self.path.is_file() {
            debug!("No version file at {}", self.path.display());
            return Version::sentinel();
        }
        match read_to_string(&self.path) {
            Ok(contents) => Version::parse(&contents),
            Err(e) => {
                warn!(
                    "Could not read version file {}: {}. Treating as not installed.",
                    self.path.display(),
                    e
                );
                Version::sentinel()
            }
        }
    }

    pub fn write(&self, version: &Version) -> Result<()> {
        debug!("Recording version '{}' in {}", version, self.path.display());
        atomic_write_file(&self.path, version.as_str().as_bytes()).map_err(|e| {
            HoistError::StorageError(format!(
                "Failed to write version file {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}
