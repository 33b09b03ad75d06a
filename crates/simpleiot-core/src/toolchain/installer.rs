//! A single installable toolchain.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::host::HostOs;
use super::process::{CommandLine, CommandRunner, OutputMode};
use super::profile::ToolProfile;
use super::spec::{Capabilities, InstallLocation, ToolSpec};
use crate::error::ToolchainError;

/// Identity, metadata and tool profile of one installable toolchain.
///
/// Install, uninstall and reset only touch the filesystem and external
/// package managers; the only field they change is `location`, which records
/// the most recent install mode requested.
#[derive(Debug, Clone)]
pub struct ToolchainInstaller {
    spec: ToolSpec,
    key: String,
    alias: String,
    name: String,
    description: String,
    location: InstallLocation,
    capabilities: Capabilities,
    executable: String,
    profile: ToolProfile,
}

impl ToolchainInstaller {
    /// Create an installer. The executable file name is fixed here for `host`.
    pub fn new(
        spec: ToolSpec,
        alias: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        profile: ToolProfile,
        host: HostOs,
    ) -> Self {
        Self {
            key: spec.key(),
            spec,
            alias: alias.into(),
            name: name.into(),
            description: description.into(),
            location: InstallLocation::Local,
            capabilities: Capabilities::all(),
            executable: profile.executable_for(host),
            profile,
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> InstallLocation {
        self.location
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn profile(&self) -> &ToolProfile {
        &self.profile
    }

    pub(crate) fn record_location(&mut self, location: InstallLocation) {
        self.location = location;
    }

    /// `base/<key>`, without touching the filesystem.
    pub fn install_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.key)
    }

    /// `base/<key>`, created on first access.
    pub fn install_path(&self, base: &Path) -> std::io::Result<PathBuf> {
        let path = self.install_dir(base);
        if !path.exists() {
            debug!(path = %path.display(), "Creating install directory");
            std::fs::create_dir_all(&path)?;
        }
        Ok(path)
    }

    pub fn exec_path(&self, install_dir: &Path) -> PathBuf {
        install_dir.join(&self.executable)
    }

    /// Command line that runs the installed executable with `command` in `source_dir`.
    pub fn invocation(&self, base: &Path, source_dir: &Path, command: &str) -> CommandLine {
        let exe = self.exec_path(&self.install_dir(base));
        CommandLine::tool(&exe, command).current_dir(source_dir)
    }

    /// Compile sources in `source_dir`. Returns the tool's success status.
    pub async fn build(
        &self,
        runner: &dyn CommandRunner,
        base: &Path,
        source_dir: &Path,
        command: &str,
    ) -> Result<bool, ToolchainError> {
        self.require(self.capabilities.can_compile, "compile")?;
        self.invoke(runner, base, source_dir, command).await
    }

    /// Upload a built image to a device.
    pub async fn flash(
        &self,
        runner: &dyn CommandRunner,
        base: &Path,
        source_dir: &Path,
        command: &str,
    ) -> Result<bool, ToolchainError> {
        self.require(self.capabilities.can_flash, "flash")?;
        self.invoke(runner, base, source_dir, command).await
    }

    /// Compile and upload with one combined command (e.g. `compile -u ...`).
    pub async fn build_and_flash(
        &self,
        runner: &dyn CommandRunner,
        base: &Path,
        source_dir: &Path,
        command: &str,
    ) -> Result<bool, ToolchainError> {
        self.require(self.capabilities.can_compile_and_flash, "compile and flash")?;
        self.invoke(runner, base, source_dir, command).await
    }

    /// Installed versions of the bundled flashing utility, comma separated.
    pub fn installed_toolchain_version(&self, host: HostOs, home: &Path) -> Option<String> {
        let versions = self.profile.installed_versions(host, home);
        if versions.is_empty() {
            None
        } else {
            Some(versions.join(", "))
        }
    }

    fn require(&self, capable: bool, action: &'static str) -> Result<(), ToolchainError> {
        if capable {
            Ok(())
        } else {
            Err(ToolchainError::CapabilityMissing {
                alias: self.alias.clone(),
                action,
            })
        }
    }

    async fn invoke(
        &self,
        runner: &dyn CommandRunner,
        base: &Path,
        source_dir: &Path,
        command: &str,
    ) -> Result<bool, ToolchainError> {
        let exe = self.exec_path(&self.install_dir(base));
        if !exe.exists() {
            return Err(ToolchainError::ExecutableMissing(exe));
        }

        let line = self.invocation(base, source_dir, command);

        info!(dir = %source_dir.display(), command = %line, "Running toolchain");
        let output = runner.run(&line, OutputMode::Streamed).await?;
        debug!(success = output.success, status = %output.status_text(), "Toolchain finished");

        Ok(output.success)
    }
}
