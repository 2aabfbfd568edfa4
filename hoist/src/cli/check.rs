//! Contains the logic for the `check` command.
use colored::Colorize;
use hoist_common::config::Config;
use hoist_common::error::Result;
use hoist_core::UpdateOrchestrator;

#[derive(clap::Args, Debug)]
pub struct Check;

impl Check {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let orchestrator = UpdateOrchestrator::new(config.clone())?;
        let check = orchestrator.check().await;

        println!("{} {}", "Local version:".bold(), check.local);
        println!("{} {}", "Remote version:".bold(), check.remote);
        if check.install_present {
            println!("{} {}", "Installed at:".bold(), config.install_root.display());
        } else {
            println!("{} {}", "Installed at:".bold(), "not installed".yellow());
        }
        if check.needs_update() {
            println!("{}{}", "==> ".bold().blue(), "An update is available".bold());
        } else {
            println!("{}{}", "==> ".bold().blue(), "Up to date".bold());
        }
        Ok(())
    }
}
