//! Toolchain management commands.

use tracing::debug;

use super::{resolve_base, resolve_target, with_spinner};
use crate::cli::{TargetArgs, ToolchainArgs, ToolchainCommands};
use crate::error::CliError;
use crate::output::get_formatter;
use simpleiot_core::ToolchainRegistry;

/// Run a toolchain command
pub async fn run_toolchain(
    args: ToolchainArgs,
    registry: &mut ToolchainRegistry,
    json: bool,
) -> Result<(), CliError> {
    match args.command {
        ToolchainCommands::Install(target) => run_install(&target, registry, json).await,
        ToolchainCommands::Uninstall(target) => run_uninstall(&target, registry, json).await,
        ToolchainCommands::Reset(target) => run_reset(&target, registry, json).await,
        ToolchainCommands::Available => {
            let formatter = get_formatter(json);
            println!("{}", formatter.format_toolchains(&registry.list_available()));
            Ok(())
        }
        ToolchainCommands::List(args) => {
            let formatter = get_formatter(json);
            let base = resolve_base(registry, &args);
            registry.prefer_installed(&base)?;
            println!(
                "{}",
                formatter.format_installed(&base, &registry.list_installed(&base))
            );
            Ok(())
        }
        ToolchainCommands::Update(_) => {
            let formatter = get_formatter(json);
            println!("{}", formatter.format_message("Not available yet."));
            Ok(())
        }
    }
}

/// Install, then bring the fresh install to a configured state.
async fn run_install(
    args: &TargetArgs,
    registry: &mut ToolchainRegistry,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let target = resolve_target(registry, args)?;
    debug!(base = %target.base.display(), spec = %target.spec, location = %target.location, "Install");

    let dir = with_spinner(
        json,
        format!("Installing {}", target.spec),
        registry.install(&target.base, &target.spec, target.location),
    )
    .await?;

    with_spinner(
        json,
        format!("Configuring {}", target.spec),
        registry.reset(&target.base, &target.spec, target.location),
    )
    .await?;

    println!("{}", formatter.format_action("Installed", &target.spec, Some(&dir)));
    Ok(())
}

async fn run_uninstall(
    args: &TargetArgs,
    registry: &mut ToolchainRegistry,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let target = resolve_target(registry, args)?;

    with_spinner(
        json,
        format!("Uninstalling {}", target.spec),
        registry.uninstall(&target.base, &target.spec, target.location),
    )
    .await?;

    println!("{}", formatter.format_action("Uninstalled", &target.spec, None));
    Ok(())
}

async fn run_reset(
    args: &TargetArgs,
    registry: &mut ToolchainRegistry,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let target = resolve_target(registry, args)?;

    with_spinner(
        json,
        format!("Resetting {}", target.spec),
        registry.reset(&target.base, &target.spec, target.location),
    )
    .await?;

    println!("{}", formatter.format_action("Reset", &target.spec, None));
    Ok(())
}
