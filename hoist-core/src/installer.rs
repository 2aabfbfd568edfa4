// hoist-core/src/installer.rs
//! Turns a downloaded archive into the live install: extract into staging,
//! find the payload, stage it next to the install root, then swap it in.
use std::fs;
use std::path::{Path, PathBuf};

use hoist_aio::extract::extract_zip_async;
use hoist_aio::fs::{
    copy_dir_filtered, create_dir_all, move_dir, remove_dir_best_effort,
    remove_directory_recursive, sibling_path,
};
use hoist_common::error::{HoistError, Result};
use hoist_common::Config;
use tracing::{debug, error, info, warn};

const INCOMING_SUFFIX: &str = "incoming";
const PREVIOUS_SUFFIX: &str = "previous";

/// Where the payload was found inside the extracted archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    /// One of the configured build directories, relative to the wrapper.
    Nested(PathBuf),
    /// Nothing nested matched; the wrapper directory itself is the payload.
    Wrapper,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedPayload {
    pub path: PathBuf,
    pub source: PayloadSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReceipt {
    pub install_root: PathBuf,
    pub source: PayloadSource,
    pub extracted_entries: usize,
}

/// Removes a scratch directory when dropped, on success and failure alike.
#[derive(Debug)]
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Clears any leftover from an earlier run. The directory itself is not
    /// created.
    fn claim(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Removing leftover {}", path.display());
            remove_directory_recursive(path).map_err(|e| {
                HoistError::InstallError(format!(
                    "Could not clear {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.path.exists() && !remove_dir_best_effort(&self.path) {
            warn!("Could not clean up {}", self.path.display());
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactInstaller {
    install_root: PathBuf,
    staging_path: PathBuf,
    executable_relative_path: PathBuf,
    payload_candidates: Vec<PathBuf>,
    excluded_dirs: Vec<String>,
}

impl ArtifactInstaller {
    pub fn from_config(config: &Config) -> Self {
        Self {
            install_root: config.install_root.clone(),
            staging_path: config.staging_path.clone(),
            executable_relative_path: config.executable_relative_path.clone(),
            payload_candidates: config.payload_candidates.clone(),
            excluded_dirs: config.excluded_dirs.clone(),
        }
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// Installs the archive at `archive`. On error the previous install is
    /// left untouched, and the staging area is gone either way.
    pub async fn install(&self, archive: &Path) -> Result<InstallReceipt> {
        let staging = ScratchDir::claim(&self.staging_path)?;
        create_dir_all(staging.path())?;

        info!("Extracting files...");
        let extracted_entries = extract_zip_async(archive, staging.path()).await?;
        debug!(
            "Extracted {} entries into {}",
            extracted_entries,
            staging.path().display()
        );

        let payload = self.locate_payload(staging.path())?;
        info!("Installing update...");
        self.promote(&payload)?;

        Ok(InstallReceipt {
            install_root: self.install_root.clone(),
            source: payload.source,
            extracted_entries,
        })
    }

    /// The archive's wrapper directory when the extraction produced exactly
    /// one top-level directory, otherwise `staging` itself.
    fn wrapper_dir(staging: &Path) -> Result<PathBuf> {
        let entries: Vec<PathBuf> = fs::read_dir(staging)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();

        match entries.as_slice() {
            [] => Err(HoistError::PayloadNotFound(
                "the downloaded archive is empty".to_string(),
            )),
            [only] if only.is_dir() => Ok(only.clone()),
            _ => Ok(staging.to_path_buf()),
        }
    }

    /// Tries each nested build directory in order, then falls back to the
    /// wrapper directory as a whole.
    pub fn locate_payload(&self, staging: &Path) -> Result<LocatedPayload> {
        let wrapper = Self::wrapper_dir(staging)?;
        debug!("Archive wrapper directory: {}", wrapper.display());

        for candidate in &self.payload_candidates {
            let path = wrapper.join(candidate);
            if path.is_dir() {
                debug!("Found nested payload at {}", path.display());
                return Ok(LocatedPayload {
                    path,
                    source: PayloadSource::Nested(candidate.clone()),
                });
            }
        }

        let has_content = fs::read_dir(&wrapper)?.next().is_some();
        if !has_content {
            return Err(HoistError::PayloadNotFound(format!(
                "no payload under {}",
                wrapper.display()
            )));
        }
        debug!("No nested build directory; using {} as payload", wrapper.display());
        Ok(LocatedPayload {
            path: wrapper,
            source: PayloadSource::Wrapper,
        })
    }

    fn promote(&self, payload: &LocatedPayload) -> Result<()> {
        if let Some(parent) = self.install_root.parent() {
            create_dir_all(parent)?;
        }
        let incoming = ScratchDir::claim(&sibling_path(&self.install_root, INCOMING_SUFFIX))?;

        match payload.source {
            PayloadSource::Nested(_) => {
                move_dir(&payload.path, incoming.path(), &self.excluded_dirs)?
            }
            PayloadSource::Wrapper => {
                copy_dir_filtered(&payload.path, incoming.path(), &self.excluded_dirs)?;
            }
        }

        let staged_exe = incoming.path().join(&self.executable_relative_path);
        if !staged_exe.is_file() {
            return Err(HoistError::PayloadNotFound(format!(
                "update does not contain {}",
                self.executable_relative_path.display()
            )));
        }

        self.swap_into_place(incoming.path())
    }

    /// Renames `incoming` over the install root, keeping the old install
    /// aside until the new one is in place.
    fn swap_into_place(&self, incoming: &Path) -> Result<()> {
        let previous = sibling_path(&self.install_root, PREVIOUS_SUFFIX);
        if previous.exists() {
            remove_directory_recursive(&previous)?;
        }

        let had_install = self.install_root.exists();
        if had_install {
            fs::rename(&self.install_root, &previous).map_err(|e| {
                HoistError::InstallError(format!(
                    "Could not move current install {} aside: {}",
                    self.install_root.display(),
                    e
                ))
            })?;
        }

        if let Err(e) = fs::rename(incoming, &self.install_root) {
            error!(
                "Could not move {} into place: {}",
                incoming.display(),
                e
            );
            if had_install {
                if let Err(restore) = fs::rename(&previous, &self.install_root) {
                    error!(
                        "Could not restore previous install from {}: {}",
                        previous.display(),
                        restore
                    );
                }
            }
            return Err(HoistError::InstallError(format!(
                "Could not install into {}: {}",
                self.install_root.display(),
                e
            )));
        }

        if had_install && !remove_dir_best_effort(&previous) {
            warn!("Could not remove previous install at {}", previous.display());
        }
        debug!("Installed into {}", self.install_root.display());
        Ok(())
    }
}
