//! Development-environment bootstrapper.
//!
//! Prepares a Python web application checkout (interpreter, isolated
//! environment, dependencies, `.env`, data directory), runs its diagnostic,
//! then launches the server in the foreground.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use tracing::debug;

use bootstrap::core::types::{EnvironmentMode, RunOptions};
use bootstrap::error::StageFailure;
use bootstrap::exit_codes;
use bootstrap::io::process::SystemRunner;
use bootstrap::io::report::Reporter;
use bootstrap::io::settings::{SETTINGS_FILE, load_settings};
use bootstrap::logging;
use bootstrap::pipeline::run_pipeline;

#[derive(Parser, Debug)]
#[command(
    name = "bootstrap",
    version,
    about = "Prepare a development environment and launch the application server"
)]
struct Cli {
    /// Port passed to the launched server.
    #[arg(long, default_value = "8000")]
    port: String,

    /// Server mode: development reloads on change, production does not.
    #[arg(long, value_enum, default_value_t = EnvironmentMode::Development)]
    environment: EnvironmentMode,

    /// Use the located interpreter directly instead of an isolated environment.
    #[arg(long)]
    skip_environment: bool,

    /// Recreate the environment, force-reinstall dependencies, overwrite `.env`.
    #[arg(long)]
    force: bool,

    /// Show package manager output and debug tracing.
    #[arg(short, long)]
    verbose: bool,

    /// Project root to bootstrap (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    project_dir: Option<PathBuf>,
}

impl Cli {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            port: self.port.clone(),
            environment: self.environment,
            skip_environment: self.skip_environment,
            force: self.force,
            verbose: self.verbose,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::OK,
                _ => exit_codes::FAILURE,
            };
            err.print().ok();
            std::process::exit(code);
        }
    };
    logging::init(cli.verbose);

    if let Err(err) = run(&cli) {
        // A stage failure already renders its cause.
        match err.downcast_ref::<StageFailure>() {
            Some(failure) => eprintln!("error: {failure}"),
            None => eprintln!("error: {err:#}"),
        }
        eprintln!("Run 'bootstrap --help' for usage.");
        std::process::exit(exit_codes::FAILURE);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let root = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("resolve current directory")?,
    };
    let settings = load_settings(&root.join(SETTINGS_FILE)).context("invalid settings")?;
    debug!(?settings, root = %root.display(), "settings loaded");

    let mut reporter = Reporter::terminal(cli.verbose);
    let report = run_pipeline(
        &root,
        &settings,
        &cli.run_options(),
        &SystemRunner::default(),
        &mut reporter,
    )?;
    debug!(?report, "pipeline finished");
    Ok(())
}
