//! Contains the logic for the `run` command.
use colored::Colorize;
use hoist_common::config::Config;
use hoist_common::error::{HoistError, Result};
use hoist_core::{LaunchOutcome, RunOptions, RunReport, UpdateOrchestrator, UpdateOutcome};

#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Download and install even when the versions match
    #[arg(long)]
    pub force: bool,

    /// Update only; do not start the application
    #[arg(long)]
    pub no_launch: bool,
}

impl RunArgs {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let orchestrator = UpdateOrchestrator::new(config.clone())?;
        let options = RunOptions {
            force_update: self.force,
            launch: !self.no_launch,
        };
        let report = orchestrator.run(options).await;
        tracing::debug!("Run finished: {:?}", report);

        if let UpdateOutcome::Updated { version, .. } = &report.update {
            println!(
                "{}{}",
                "==> ".bold().blue(),
                format!("Updated to {version}").bold()
            );
        }

        if let LaunchOutcome::Launched(process) = &report.launch {
            println!(
                "{}{}",
                "==> ".bold().blue(),
                format!("Application launched (pid {})", process.pid).bold()
            );
        }
        run_result(report, self.no_launch)
    }
}

/// The launch decides the exit status. A failed update is already logged by
/// the orchestrator and only surfaces here when nothing was launched.
fn run_result(report: RunReport, no_launch: bool) -> Result<()> {
    match report.launch {
        LaunchOutcome::Launched(_) => Ok(()),
        LaunchOutcome::Failed(e) => Err(e),
        LaunchOutcome::Skipped => match report.update {
            UpdateOutcome::Failed(e) => Err(e),
            _ if no_launch => Ok(()),
            _ => Err(HoistError::Generic("Application was not launched".to_string())),
        },
    }
}
