// hoist/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use hoist_common::error::Result;
use hoist_common::Config;

pub mod check;
pub mod run;

use crate::cli::check::Check;
use crate::cli::run::RunArgs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "hoist", bin_name = "hoist")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Show progress and wait for Enter before exiting
    #[arg(long, visible_alias = "debug", global = true)]
    pub console: bool,

    /// Read settings from this TOML file instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Do not install the launcher or its desktop shortcut
    #[arg(long, global = true)]
    pub no_bootstrap: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Update the application if needed, then launch it (default)
    Run(RunArgs),
    /// Compare local and remote versions without changing anything
    Check(Check),
}

impl Default for Command {
    fn default() -> Self {
        Self::Run(RunArgs::default())
    }
}

impl Command {
    pub async fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Run(command) => command.run(config).await,
            Self::Check(command) => command.run(config).await,
        }
    }
}
