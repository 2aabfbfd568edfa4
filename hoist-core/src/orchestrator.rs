// hoist-core/src/orchestrator.rs
//! One launcher run: compare versions, update if needed, launch.
use std::path::PathBuf;

use hoist_common::error::{HoistError, Result};
use hoist_common::{Config, UpdateFailurePolicy, Version};
use hoist_net::{build_http_client, fetch_archive_or_fail, resolve_version_or_default, validate_url};
use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::installer::{ArtifactInstaller, InstallReceipt};
use crate::launcher::{AppLauncher, ExecutableDescriptor, Launch, LaunchedProcess};
use crate::version_store::VersionStore;

/// Versions compare as opaque strings. A missing install always needs an
/// update, even when the recorded version matches.
pub fn needs_update(local: &Version, remote: &Version, install_present: bool) -> bool {
    local != remote || !install_present
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    pub local: Version,
    pub remote: Version,
    pub install_present: bool,
}

impl UpdateCheck {
    pub fn needs_update(&self) -> bool {
        needs_update(&self.local, &self.remote, self.install_present)
    }
}

#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    UpToDate,
    Updated {
        version: Version,
        receipt: InstallReceipt,
    },
    Failed(HoistError),
}

#[derive(Debug, Clone)]
pub enum LaunchOutcome {
    Launched(LaunchedProcess),
    Skipped,
    Failed(HoistError),
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub check: UpdateCheck,
    pub update: UpdateOutcome,
    pub launch: LaunchOutcome,
}

impl RunReport {
    pub fn launched(&self) -> bool {
        matches!(self.launch, LaunchOutcome::Launched(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Update even when the versions match.
    pub force_update: bool,
    pub launch: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            force_update: false,
            launch: true,
        }
    }
}

pub struct UpdateOrchestrator<L = AppLauncher> {
    config: Config,
    client: Client,
    store: VersionStore,
    installer: ArtifactInstaller,
    launcher: L,
}

impl UpdateOrchestrator<AppLauncher> {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_launcher(config, AppLauncher)
    }
}

impl<L: Launch> UpdateOrchestrator<L> {
    pub fn with_launcher(config: Config, launcher: L) -> Result<Self> {
        config.validate()?;
        validate_url(&config.repo_archive_url)?;
        validate_url(&config.remote_version_url)?;
        let client = build_http_client()?;
        Ok(Self {
            store: VersionStore::from_config(&config),
            installer: ArtifactInstaller::from_config(&config),
            config,
            client,
            launcher,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn version_store(&self) -> &VersionStore {
        &self.store
    }

    pub async fn check(&self) -> UpdateCheck {
        let local = self.store.read();
        let remote = resolve_version_or_default(
            &self.client,
            &self.config.remote_version_url,
            self.config.http_timeout(),
        )
        .await;
        let install_present = self.config.install_root.is_dir();
        debug!(
            "Local '{}', remote '{}', install present: {}",
            local, remote, install_present
        );
        UpdateCheck {
            local,
            remote,
            install_present,
        }
    }

    // The archive sits next to the staging area, which the installer wipes.
    fn download_dir(&self) -> PathBuf {
        self.config
            .staging_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Downloads and installs the current archive, then records `remote` as
    /// the local version. The version file is only written after a
    /// successful install.
    pub async fn update(&self, remote: &Version) -> Result<InstallReceipt> {
        let archive = fetch_archive_or_fail(
            &self.client,
            &self.config.repo_archive_url,
            &self.download_dir(),
            self.config.download_timeout(),
        )
        .await?;
        let receipt = self.installer.install(archive.path()).await?;
        drop(archive);
        self.store.write(remote)?;
        Ok(receipt)
    }

    pub fn launch(&self) -> Result<LaunchedProcess> {
        self.launcher
            .launch(&ExecutableDescriptor::from_config(&self.config))
    }

    fn launch_allowed_after(&self, failure: &HoistError) -> bool {
        failure.is_update_abort() && self.config.on_update_failure == UpdateFailurePolicy::Launch
    }

    pub async fn run(&self, options: RunOptions) -> RunReport {
        info!("Checking for updates...");
        let check = self.check().await;
        info!("Local version: '{}'", check.local);
        info!("Remote version: '{}'", check.remote);

        let update = if options.force_update || check.needs_update() {
            info!("Update found! Downloading...");
            match self.update(&check.remote).await {
                Ok(receipt) => {
                    info!("Update completed!");
                    UpdateOutcome::Updated {
                        version: check.remote.clone(),
                        receipt,
                    }
                }
                Err(e) => {
                    error!("Update failed: {}", e);
                    UpdateOutcome::Failed(e)
                }
            }
        } else {
            info!("No updates found.");
            UpdateOutcome::UpToDate
        };

        let launch = match &update {
            _ if !options.launch => LaunchOutcome::Skipped,
            UpdateOutcome::Failed(e) if !self.launch_allowed_after(e) => {
                warn!("Not launching the application after the failed update");
                LaunchOutcome::Skipped
            }
            _ => {
                info!("Launching application...");
                match self.launch() {
                    Ok(process) => LaunchOutcome::Launched(process),
                    Err(e) => {
                        error!("Launch failed: {}", e);
                        LaunchOutcome::Failed(e)
                    }
                }
            }
        };

        RunReport {
            check,
            update,
            launch,
        }
    }
}
