//! Command implementations.

pub mod firmware;
pub mod toolchain;

pub use firmware::run_firmware;
pub use toolchain::run_toolchain;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::{BaseArgs, TargetArgs};
use crate::error::CliError;
use simpleiot_core::paths;
use simpleiot_core::toolchain::esp32_arduino::LATEST_TOOLCHAIN_VERSION;
use simpleiot_core::{InstallLocation, ToolSpec, ToolchainRegistry};

/// A toolchain selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub base: PathBuf,
    pub spec: ToolSpec,
    pub location: InstallLocation,
}

/// Toolchain base directory, with a leading `~` expanded.
pub fn resolve_base(registry: &ToolchainRegistry, args: &BaseArgs) -> PathBuf {
    match &args.base {
        Some(base) => paths::expand_home(base, registry.home()),
        None => paths::toolchain_base_in(registry.home()),
    }
}

/// Resolve `--alias` or the identity flags to a registry target.
///
/// The built-in toolchain is first rebound to a version already installed
/// under the base, so later commands find what install created.
pub fn resolve_target(
    registry: &mut ToolchainRegistry,
    args: &TargetArgs,
) -> Result<Target, CliError> {
    let base = resolve_base(registry, &args.base);
    registry.prefer_installed(&base)?;

    if let Some(alias) = &args.alias {
        let target = registry.resolve_alias(alias)?;
        return Ok(Target {
            base,
            spec: target.spec,
            location: target.location,
        });
    }

    let version = args
        .version
        .clone()
        .or_else(|| registry.default_version().map(str::to_string))
        .unwrap_or_else(|| LATEST_TOOLCHAIN_VERSION.to_string());

    Ok(Target {
        base,
        spec: ToolSpec::new(&args.manufacturer, &args.processor, &args.os, version),
        location: args.location.into(),
    })
}

fn spinner(json: bool, message: String) -> ProgressBar {
    if json {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Await `task` behind a spinner that is cleared whatever the outcome.
pub(crate) async fn with_spinner<T, E, F>(json: bool, message: String, task: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let pb = spinner(json, message);
    let result = task.await;
    pb.finish_and_clear();
    result
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use simpleiot_core::toolchain::{esp32_arduino, HttpFetcher, SystemRunner};
    use simpleiot_core::{HostOs, ToolchainRegistry};

    /// Registry rooted at `home` with the built-in toolchain at version 3.3.0.
    pub fn registry(home: &std::path::Path) -> ToolchainRegistry {
        let mut registry = ToolchainRegistry::new(
            HostOs::Unix,
            home,
            Arc::new(SystemRunner::new()),
            Arc::new(HttpFetcher::new().unwrap()),
        );
        registry
            .register(esp32_arduino::installer("3.3.0", HostOs::Unix))
            .unwrap();
        registry
    }
}
