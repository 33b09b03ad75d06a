//! SimpleIOT CLI - toolchain and firmware management for SimpleIOT devices.
//!
//! Installs and configures the local build toolchain, then compiles and
//! flashes device firmware with it.

mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::{exit_codes, CliError};
use simpleiot_core::toolchain::esp32_arduino::LATEST_TOOLCHAIN_VERSION;
use simpleiot_core::ToolchainRegistry;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Logs go to stderr so stdout stays clean for `--json`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut registry = ToolchainRegistry::with_defaults(LATEST_TOOLCHAIN_VERSION)?;

    match cli.command {
        Commands::Toolchain(args) => {
            commands::run_toolchain(args, &mut registry, cli.json).await
        }
        Commands::Firmware(args) => {
            commands::run_firmware(args, &mut registry, cli.json).await
        }
    }
}
