//! Registry of installable toolchains.
//!
//! Maps the opaque key of each [`ToolSpec`] to its [`ToolchainInstaller`] and
//! each alias to its identity. Lifecycle operations are dispatched to the
//! platform executor of the host the registry was built for.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::esp32_arduino;
use super::fetch::{ArchiveFetcher, HttpFetcher};
use super::host::HostOs;
use super::installer::ToolchainInstaller;
use super::platform::{self, PlatformEnv, PlatformToolchain};
use super::process::{CommandRunner, SystemRunner};
use super::spec::{InstallLocation, ToolSpec};
use crate::error::{CoreError, ToolchainError};
use crate::paths;

/// Identity an alias resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasTarget {
    pub spec: ToolSpec,
    pub location: InstallLocation,
}

/// A registered toolchain whose install directory exists under a base.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledToolchain {
    pub alias: String,
    pub spec: ToolSpec,
    pub key: String,
    pub path: PathBuf,
    pub executable_present: bool,
}

pub struct ToolchainRegistry {
    installers: HashMap<String, ToolchainInstaller>,
    aliases: HashMap<String, AliasTarget>,
    host: HostOs,
    home: PathBuf,
    default_version: Option<String>,
    fallback_version: Option<String>,
    runner: Arc<dyn CommandRunner>,
    fetcher: Arc<dyn ArchiveFetcher>,
}

impl ToolchainRegistry {
    /// Empty registry for `host`.
    pub fn new(
        host: HostOs,
        home: impl Into<PathBuf>,
        runner: Arc<dyn CommandRunner>,
        fetcher: Arc<dyn ArchiveFetcher>,
    ) -> Self {
        Self {
            installers: HashMap::new(),
            aliases: HashMap::new(),
            host,
            home: home.into(),
            default_version: None,
            fallback_version: None,
            runner,
            fetcher,
        }
    }

    /// Registry for the running host with every built-in toolchain registered.
    pub fn with_defaults(default_version: &str) -> Result<Self, CoreError> {
        let host = HostOs::detect()?;
        let home = paths::home_dir()
            .ok_or_else(|| CoreError::Other("Could not determine home directory".to_string()))?;

        let mut registry = Self::new(
            host,
            home,
            Arc::new(SystemRunner::new()),
            Arc::new(HttpFetcher::new()?),
        );
        registry.register_builtin(default_version)?;
        Ok(registry)
    }

    /// Register the built-in toolchains.
    ///
    /// The ESP32/Arduino version is the newest one already installed on this
    /// machine, falling back to `default_version`.
    pub fn register_builtin(&mut self, default_version: &str) -> Result<(), ToolchainError> {
        let version = esp32_arduino::resolve_version(self.host, &self.home, default_version);
        self.default_version = Some(version.clone());
        self.fallback_version = Some(default_version.to_string());
        self.register(esp32_arduino::installer(&version, self.host))
    }

    /// Rebind the built-in toolchain to a version already installed under `base`.
    ///
    /// Reset installs a newer esptool than the one the toolchain was installed
    /// at, so the version picked at registration can drift from what is on
    /// disk. An existing install directory under `base` takes precedence.
    pub fn prefer_installed(&mut self, base: &Path) -> Result<(), ToolchainError> {
        let current = match &self.default_version {
            Some(version) => version.clone(),
            None => return Ok(()),
        };
        let current = esp32_arduino::installer(&current, self.host);
        if current.install_dir(base).is_dir() {
            return Ok(());
        }

        let fallback = self
            .fallback_version
            .clone()
            .unwrap_or_else(|| current.spec().version().to_string());
        let installed = esp32_arduino::candidate_versions(self.host, &self.home, &fallback)
            .into_iter()
            .map(|version| esp32_arduino::installer(&version, self.host))
            .find(|installer| installer.install_dir(base).is_dir());

        let installed = match installed {
            Some(installer) => installer,
            None => return Ok(()),
        };

        debug!(from = %current.spec(), to = %installed.spec(), base = %base.display(), "Using installed toolchain");
        self.installers.remove(current.key());
        if self
            .aliases
            .get(current.alias())
            .is_some_and(|target| target.spec == *current.spec())
        {
            self.aliases.remove(current.alias());
        }
        self.default_version = Some(installed.spec().version().to_string());
        self.register(installed)
    }

    /// Add an installer. Re-registering the same key overwrites it; an alias
    /// already bound to a different key is rejected.
    pub fn register(&mut self, installer: ToolchainInstaller) -> Result<(), ToolchainError> {
        if let Some(existing) = self.aliases.get(installer.alias()) {
            if existing.spec.key() != installer.key() {
                return Err(ToolchainError::DuplicateAlias {
                    alias: installer.alias().to_string(),
                    existing: existing.spec.to_string(),
                });
            }
        }

        debug!(alias = installer.alias(), spec = %installer.spec(), key = installer.key(), "Registering toolchain");

        self.aliases.insert(
            installer.alias().to_string(),
            AliasTarget {
                spec: installer.spec().clone(),
                location: installer.location(),
            },
        );
        self.installers.insert(installer.key().to_string(), installer);
        Ok(())
    }

    pub fn resolve_alias(&self, alias: &str) -> Result<AliasTarget, ToolchainError> {
        self.aliases
            .get(alias)
            .cloned()
            .ok_or_else(|| ToolchainError::AliasNotFound(alias.to_string()))
    }

    pub fn host(&self) -> HostOs {
        self.host
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Version chosen for the built-in toolchain, if registered.
    pub fn default_version(&self) -> Option<&str> {
        self.default_version.as_deref()
    }

    pub fn installer(&self, spec: &ToolSpec) -> Result<&ToolchainInstaller, ToolchainError> {
        self.installers
            .get(&spec.key())
            .ok_or_else(|| ToolchainError::NotFound {
                spec: spec.to_string(),
            })
    }

    /// Every registered installer, ordered by alias.
    pub fn list_available(&self) -> Vec<&ToolchainInstaller> {
        let mut installers: Vec<_> = self.installers.values().collect();
        installers.sort_by(|a, b| a.alias().cmp(b.alias()).then_with(|| a.key().cmp(b.key())));
        installers
    }

    /// Registered toolchains whose install directory exists under `base`.
    pub fn list_installed(&self, base: &Path) -> Vec<InstalledToolchain> {
        self.list_available()
            .into_iter()
            .filter_map(|installer| {
                let path = installer.install_dir(base);
                if !path.is_dir() {
                    return None;
                }
                Some(InstalledToolchain {
                    alias: installer.alias().to_string(),
                    spec: installer.spec().clone(),
                    key: installer.key().to_string(),
                    executable_present: installer.exec_path(&path).exists(),
                    path,
                })
            })
            .collect()
    }

    /// Install a toolchain under `base/<key>` and return that directory.
    pub async fn install(
        &mut self,
        base: &Path,
        spec: &ToolSpec,
        location: InstallLocation,
    ) -> Result<PathBuf, ToolchainError> {
        let platform = self.platform();
        let installer = self
            .installers
            .get_mut(&spec.key())
            .ok_or_else(|| ToolchainError::NotFound {
                spec: spec.to_string(),
            })?;

        installer.record_location(location);
        require_local(location)?;

        let profile = installer.profile().clone();
        let dir = installer.install_path(base)?;

        info!(spec = %spec, host = %self.host, dir = %dir.display(), "Installing toolchain");
        platform.install(&profile, &dir).await?;
        Ok(dir)
    }

    pub async fn install_alias(&mut self, base: &Path, alias: &str) -> Result<PathBuf, ToolchainError> {
        let target = self.resolve_alias(alias)?;
        self.install(base, &target.spec, target.location).await
    }

    /// Uninstall a toolchain. The install directory is removed afterwards even
    /// when the platform step fails; the platform error is still returned.
    pub async fn uninstall(
        &self,
        base: &Path,
        spec: &ToolSpec,
        location: InstallLocation,
    ) -> Result<(), ToolchainError> {
        let installer = self.installer(spec)?;
        require_local(location)?;

        let dir = installer.install_dir(base);
        info!(spec = %spec, dir = %dir.display(), "Uninstalling toolchain");
        let result = self.platform().uninstall(installer.profile(), &dir).await;

        if dir.exists() {
            debug!(dir = %dir.display(), "Removing install directory");
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                if result.is_ok() {
                    return Err(e.into());
                }
                warn!(dir = %dir.display(), error = %e, "Failed to remove install directory");
            }
        }

        result
    }

    /// Reconfigure an installed toolchain. Safe to re-run.
    pub async fn reset(
        &self,
        base: &Path,
        spec: &ToolSpec,
        location: InstallLocation,
    ) -> Result<(), ToolchainError> {
        let installer = self.installer(spec)?;
        require_local(location)?;

        let dir = installer.install_dir(base);
        info!(spec = %spec, dir = %dir.display(), "Resetting toolchain");
        self.platform().reset(installer.profile(), &dir).await
    }

    pub async fn build(
        &self,
        base: &Path,
        spec: &ToolSpec,
        source_dir: &Path,
        command: &str,
    ) -> Result<bool, ToolchainError> {
        self.installer(spec)?
            .build(self.runner.as_ref(), base, source_dir, command)
            .await
    }

    pub async fn flash(
        &self,
        base: &Path,
        spec: &ToolSpec,
        source_dir: &Path,
        command: &str,
    ) -> Result<bool, ToolchainError> {
        self.installer(spec)?
            .flash(self.runner.as_ref(), base, source_dir, command)
            .await
    }

    pub async fn build_and_flash(
        &self,
        base: &Path,
        spec: &ToolSpec,
        source_dir: &Path,
        command: &str,
    ) -> Result<bool, ToolchainError> {
        self.installer(spec)?
            .build_and_flash(self.runner.as_ref(), base, source_dir, command)
            .await
    }

    fn platform(&self) -> Box<dyn PlatformToolchain> {
        platform::for_host(
            self.host,
            PlatformEnv {
                runner: self.runner.clone(),
                fetcher: self.fetcher.clone(),
                home: self.home.clone(),
            },
        )
    }
}

fn require_local(location: InstallLocation) -> Result<(), ToolchainError> {
    match location {
        InstallLocation::Local => Ok(()),
        other => Err(ToolchainError::UnsupportedLocation(other)),
    }
}
