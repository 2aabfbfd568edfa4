// hoist/src/main.rs
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::{env, fs, process};

use clap::Parser;
use colored::Colorize;
use hoist_common::config::Config;
use hoist_common::error::Result;
use hoist_core::LauncherBootstrap;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, warn};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{CliArgs, Command};

fn level_filter(verbose: u8, console: bool) -> LevelFilter {
    match (verbose, console) {
        (0, false) => LevelFilter::WARN,
        (0, true) => LevelFilter::INFO,
        (1, _) => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn init_logging(cli_args: &CliArgs, log_dir: &Path) {
    let level_filter = level_filter(cli_args.verbose, cli_args.console);
    let max_log_level = level_filter.into_level().unwrap_or(tracing::Level::WARN);

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("HOIST_LOG")
        .from_env_lossy();

    if cli_args.verbose == 0 {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .with_ansi(true)
            .without_time()
            .try_init();
        return;
    }

    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!(
            "{} Failed to create log directory {}: {}",
            "Warning:".yellow(),
            log_dir.display(),
            e
        );
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .with_ansi(true)
            .without_time()
            .try_init();
        return;
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, "hoist.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_writer = io::stderr.with_max_level(max_log_level);
    let file_writer = non_blocking_appender.with_max_level(max_log_level);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr_writer.and(file_writer))
        .with_ansi(true)
        .without_time()
        .try_init();

    Box::leak(Box::new(guard)); // Keep guard alive

    debug!(
        "Verbose logging enabled. Writing logs to: {}/hoist.log",
        log_dir.display()
    );
}

/// Puts the launcher into its stable location and a desktop entry next to
/// the user. Nothing here is allowed to stop the run.
fn bootstrap(config: &Config, console: bool) {
    let bootstrap = LauncherBootstrap::from_config(config);
    if bootstrap.is_installed() && !console {
        debug!("Launcher already installed at {}", bootstrap.installed_path().display());
        return;
    }

    match env::current_exe() {
        Ok(current_exe) => {
            if let Err(e) = bootstrap.install_launcher(&current_exe) {
                warn!("Could not install launcher: {}", e);
                eprintln!("{} Could not install launcher: {}", "Warning:".yellow(), e);
            }
        }
        Err(e) => warn!("Could not determine the running executable: {}", e),
    }

    if let Err(e) = bootstrap.create_desktop_entry() {
        warn!("Could not create desktop shortcut: {}", e);
        eprintln!("{} Could not create desktop shortcut: {}", "Warning:".yellow(), e);
    }
}

async fn run(cli_args: &CliArgs) -> Result<()> {
    let config = Config::load(cli_args.config.as_deref())?;
    init_logging(cli_args, &config.logs_dir());
    debug!("Loaded configuration: {:?}", config);

    if cli_args.console {
        println!("{}", format!("=== {} Launcher ===", config.shortcut_name).bold());
    }

    let default_command = Command::default();
    let command = cli_args.command.as_ref().unwrap_or(&default_command);

    if !cli_args.no_bootstrap && matches!(command, Command::Run(_)) {
        bootstrap(&config, cli_args.console);
    }

    command.run(&config).await
}

fn wait_for_enter(prompt: &str) {
    print!("{prompt}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}

#[tokio::main]
async fn main() {
    let cli_args = CliArgs::parse();

    let exit_code = match run(&cli_args).await {
        Ok(()) => {
            debug!("Command completed successfully.");
            if cli_args.console {
                wait_for_enter("Press Enter to close...");
            }
            0
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            if cli_args.console {
                wait_for_enter("Press Enter to exit...");
            }
            1
        }
    };

    process::exit(exit_code);
}
