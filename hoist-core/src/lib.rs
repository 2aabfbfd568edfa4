// hoist-core/src/lib.rs
//! The update-then-launch workflow of the hoist launcher.

pub mod bootstrap;
pub mod installer;
pub mod launcher;
pub mod orchestrator;
pub mod version_store;

pub use bootstrap::LauncherBootstrap;
pub use installer::{ArtifactInstaller, InstallReceipt, PayloadSource};
pub use launcher::{AppLauncher, ExecutableDescriptor, Launch, LaunchedProcess};
pub use orchestrator::{
    needs_update, LaunchOutcome, RunOptions, RunReport, UpdateCheck, UpdateOrchestrator,
    UpdateOutcome,
};
pub use version_store::VersionStore;
