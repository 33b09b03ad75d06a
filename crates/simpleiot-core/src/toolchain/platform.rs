//! Per-host install, uninstall and reset executors.
//!
//! One executor per supported host OS, each driven by a [`ToolProfile`]:
//!
//! - macOS reuses a tool already on PATH or installs it with Homebrew, then
//!   links it into the install directory.
//! - Windows downloads the release zip and always replaces any existing
//!   executable.
//! - Other POSIX hosts run the vendor install script and refuse to run when an
//!   executable is already present.
//!
//! Reset is shared: it reconfigures an installed tool and stops at the first
//! failing step. Completed steps are not rolled back; reset is safe to re-run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::fetch::{self, ArchiveFetcher};
use super::host::HostOs;
use super::process::{run_step, CommandLine, CommandRunner};
use super::profile::ToolProfile;
use crate::error::ToolchainError;

/// Collaborators shared by every executor.
#[derive(Clone)]
pub struct PlatformEnv {
    pub runner: Arc<dyn CommandRunner>,
    pub fetcher: Arc<dyn ArchiveFetcher>,
    /// Home directory of the operator, root of the tool's data directory
    pub home: PathBuf,
}

#[async_trait]
pub trait PlatformToolchain: Send + Sync {
    fn host(&self) -> HostOs;

    async fn install(&self, profile: &ToolProfile, install_dir: &Path)
        -> Result<(), ToolchainError>;

    async fn uninstall(
        &self,
        profile: &ToolProfile,
        install_dir: &Path,
    ) -> Result<(), ToolchainError>;

    async fn reset(&self, profile: &ToolProfile, install_dir: &Path) -> Result<(), ToolchainError>;
}

/// Executor for `host`.
pub fn for_host(host: HostOs, env: PlatformEnv) -> Box<dyn PlatformToolchain> {
    match host {
        HostOs::MacOs => Box::new(MacPlatform { env }),
        HostOs::Windows => Box::new(WindowsPlatform { env }),
        HostOs::Unix => Box::new(UnixPlatform { env }),
    }
}

pub struct MacPlatform {
    env: PlatformEnv,
}

#[async_trait]
impl PlatformToolchain for MacPlatform {
    fn host(&self) -> HostOs {
        HostOs::MacOs
    }

    async fn install(
        &self,
        profile: &ToolProfile,
        install_dir: &Path,
    ) -> Result<(), ToolchainError> {
        let exe = install_dir.join(profile.executable_for(self.host()));
        if exe.exists() {
            info!(path = %exe.display(), "Toolchain executable already present, reusing");
            return Ok(());
        }
        if remove_executable(&exe)? {
            debug!(path = %exe.display(), "Removed dangling link");
        }

        let runner = self.env.runner.as_ref();
        let source = match runner.locate(profile.executable) {
            Some(found) => {
                debug!(path = %found.display(), "Reusing executable found on PATH");
                found
            }
            None => {
                if runner.locate("brew").is_none() {
                    return Err(ToolchainError::PrerequisiteMissing {
                        name: "Homebrew".to_string(),
                        hint: "https://brew.sh/".to_string(),
                    });
                }

                run_step(runner, &CommandLine::shell(profile.brew_install_command())).await?;

                runner
                    .locate(profile.executable)
                    .ok_or_else(|| ToolchainError::ExecutableMissing(PathBuf::from(profile.executable)))?
            }
        };

        link_executable(&source, &exe)?;
        info!(path = %exe.display(), target = %source.display(), "Toolchain linked");
        Ok(())
    }

    async fn uninstall(
        &self,
        profile: &ToolProfile,
        install_dir: &Path,
    ) -> Result<(), ToolchainError> {
        let exe = install_dir.join(profile.executable_for(self.host()));
        remove_executable(&exe)?;

        let runner = self.env.runner.as_ref();
        if runner.locate(profile.executable).is_none() {
            warn!(executable = profile.executable, "Not found in PATH, nothing to remove");
            return Ok(());
        }
        if runner.locate("brew").is_none() {
            return Err(ToolchainError::PrerequisiteMissing {
                name: "Homebrew".to_string(),
                hint: "https://brew.sh/".to_string(),
            });
        }

        run_step(runner, &CommandLine::shell(profile.brew_uninstall_command())).await?;
        Ok(())
    }

    async fn reset(&self, profile: &ToolProfile, install_dir: &Path) -> Result<(), ToolchainError> {
        reset_tool(&self.env, self.host(), profile, install_dir).await
    }
}

pub struct WindowsPlatform {
    env: PlatformEnv,
}

#[async_trait]
impl PlatformToolchain for WindowsPlatform {
    fn host(&self) -> HostOs {
        HostOs::Windows
    }

    async fn install(
        &self,
        profile: &ToolProfile,
        install_dir: &Path,
    ) -> Result<(), ToolchainError> {
        let exe_name = profile.executable_for(self.host());
        let exe = install_dir.join(&exe_name);

        // Reinstall always overwrites.
        if exe.exists() {
            debug!(path = %exe.display(), "Removing existing executable");
            tokio::fs::remove_file(&exe).await?;
        }

        let temp = tempfile::Builder::new().prefix("iot").tempdir()?;
        let archive = temp.path().join(format!("{}.zip", profile.executable));

        self.env
            .fetcher
            .fetch(profile.windows_archive_url, &archive)
            .await?;
        fetch::extract_file(&archive, &exe_name, &exe)?;

        info!(path = %exe.display(), "Toolchain installed");
        Ok(())
    }

    async fn uninstall(
        &self,
        profile: &ToolProfile,
        install_dir: &Path,
    ) -> Result<(), ToolchainError> {
        let exe = install_dir.join(profile.executable_for(self.host()));
        if !remove_executable(&exe)? {
            warn!(path = %exe.display(), "Toolchain executable not found");
        }
        Ok(())
    }

    async fn reset(&self, profile: &ToolProfile, install_dir: &Path) -> Result<(), ToolchainError> {
        reset_tool(&self.env, self.host(), profile, install_dir).await
    }
}

pub struct UnixPlatform {
    env: PlatformEnv,
}

#[async_trait]
impl PlatformToolchain for UnixPlatform {
    fn host(&self) -> HostOs {
        HostOs::Unix
    }

    async fn install(
        &self,
        profile: &ToolProfile,
        install_dir: &Path,
    ) -> Result<(), ToolchainError> {
        let exe = install_dir.join(profile.executable_for(self.host()));

        // Never overwrites; uninstall first.
        if exe.exists() {
            return Err(ToolchainError::AlreadyInstalled(exe));
        }

        let script = CommandLine::shell(profile.install_script_command(install_dir));
        run_step(self.env.runner.as_ref(), &script).await?;

        if !exe.exists() {
            return Err(ToolchainError::ExecutableMissing(exe));
        }

        info!(path = %exe.display(), "Toolchain installed");
        Ok(())
    }

    async fn uninstall(
        &self,
        profile: &ToolProfile,
        install_dir: &Path,
    ) -> Result<(), ToolchainError> {
        let exe = install_dir.join(profile.executable_for(self.host()));
        if !remove_executable(&exe)? {
            warn!(path = %exe.display(), "Toolchain executable not found");
        }
        Ok(())
    }

    async fn reset(&self, profile: &ToolProfile, install_dir: &Path) -> Result<(), ToolchainError> {
        reset_tool(&self.env, self.host(), profile, install_dir).await
    }
}

async fn reset_tool(
    env: &PlatformEnv,
    host: HostOs,
    profile: &ToolProfile,
    install_dir: &Path,
) -> Result<(), ToolchainError> {
    let exe = install_dir.join(profile.executable_for(host));
    if !exe.exists() {
        return Err(ToolchainError::ExecutableMissing(exe));
    }

    let runner = env.runner.as_ref();

    if let Some(init) = profile.config_init {
        let config = profile.config_path(host, &env.home);
        if config.exists() {
            debug!(config = %config.display(), "Tool config present, skipping init");
        } else {
            run_step(runner, &CommandLine::tool(&exe, init)).await?;
        }
    }

    for step in profile.setup_steps {
        run_step(runner, &CommandLine::tool(&exe, *step)).await?;
    }

    info!(path = %exe.display(), steps = profile.setup_steps.len(), "Toolchain configured");
    Ok(())
}

#[cfg(unix)]
fn link_executable(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, dest)
}

#[cfg(not(unix))]
fn link_executable(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::copy(source, dest).map(|_| ())
}

/// Remove an executable or a dangling link to one. Returns whether anything was removed.
fn remove_executable(path: &Path) -> std::io::Result<bool> {
    if path.symlink_metadata().is_err() {
        return Ok(false);
    }
    std::fs::remove_file(path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::esp32_arduino::PROFILE;
    use crate::toolchain::testing::{zip_bytes, FakeFetcher, FakeRunner};

    struct Fixture {
        runner: Arc<FakeRunner>,
        fetcher: Arc<FakeFetcher>,
        home: tempfile::TempDir,
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(runner: FakeRunner) -> Self {
            Self {
                runner: Arc::new(runner),
                fetcher: Arc::new(FakeFetcher::serving(zip_bytes(&[(
                    "arduino-cli/arduino-cli.exe",
                    b"v1".as_slice(),
                )]))),
                home: tempfile::tempdir().unwrap(),
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn platform(&self, host: HostOs) -> Box<dyn PlatformToolchain> {
            for_host(
                host,
                PlatformEnv {
                    runner: self.runner.clone(),
                    fetcher: self.fetcher.clone(),
                    home: self.home.path().to_path_buf(),
                },
            )
        }

        fn exe(&self, host: HostOs) -> PathBuf {
            self.dir.path().join(PROFILE.executable_for(host))
        }
    }

    #[tokio::test]
    async fn test_windows_install_overwrites() {
        let fx = Fixture::new(FakeRunner::new());
        let platform = fx.platform(HostOs::Windows);

        platform.install(&PROFILE, fx.dir.path()).await.unwrap();
        assert_eq!(std::fs::read(fx.exe(HostOs::Windows)).unwrap(), b"v1");

        fx.fetcher
            .set_archive(zip_bytes(&[("arduino-cli/arduino-cli.exe", b"v2".as_slice())]));
        platform.install(&PROFILE, fx.dir.path()).await.unwrap();
        assert_eq!(std::fs::read(fx.exe(HostOs::Windows)).unwrap(), b"v2");

        assert_eq!(
            fx.fetcher.urls(),
            vec![PROFILE.windows_archive_url.to_string(); 2]
        );
    }

    #[tokio::test]
    async fn test_unix_install_refuses_existing_binary() {
        let fx = Fixture::new(FakeRunner::new());
        let platform = fx.platform(HostOs::Unix);
        std::fs::write(fx.exe(HostOs::Unix), b"old").unwrap();

        let err = platform.install(&PROFILE, fx.dir.path()).await.unwrap_err();
        assert!(matches!(err, ToolchainError::AlreadyInstalled(path) if path == fx.exe(HostOs::Unix)));
        assert!(fx.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unix_install_runs_script_into_install_dir() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new().creating(dir.path().join("arduino-cli"));
        let fx = Fixture {
            dir,
            ..Fixture::new(runner)
        };
        let platform = fx.platform(HostOs::Unix);

        platform.install(&PROFILE, fx.dir.path()).await.unwrap();
        assert_eq!(
            fx.runner.rendered(),
            vec![PROFILE.install_script_command(fx.dir.path())]
        );

        // Second install without uninstall is refused.
        let err = platform.install(&PROFILE, fx.dir.path()).await.unwrap_err();
        assert!(matches!(err, ToolchainError::AlreadyInstalled(_)));
    }

    #[tokio::test]
    async fn test_unix_install_detects_missing_binary() {
        let fx = Fixture::new(FakeRunner::new());
        let platform = fx.platform(HostOs::Unix);

        let err = platform.install(&PROFILE, fx.dir.path()).await.unwrap_err();
        assert!(matches!(err, ToolchainError::ExecutableMissing(_)));
    }

    #[tokio::test]
    async fn test_mac_install_requires_homebrew() {
        let fx = Fixture::new(FakeRunner::new());
        let platform = fx.platform(HostOs::MacOs);

        let err = platform.install(&PROFILE, fx.dir.path()).await.unwrap_err();
        assert!(matches!(err, ToolchainError::PrerequisiteMissing { ref name, .. } if name == "Homebrew"));
        assert!(err.is_precondition());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_mac_install_links_tool_from_path() {
        let bin = tempfile::tempdir().unwrap();
        let found = bin.path().join("arduino-cli");
        std::fs::write(&found, b"tool").unwrap();

        let fx = Fixture::new(FakeRunner::new().with_program("arduino-cli", &found));
        let platform = fx.platform(HostOs::MacOs);

        platform.install(&PROFILE, fx.dir.path()).await.unwrap();
        let exe = fx.exe(HostOs::MacOs);
        assert_eq!(std::fs::read_link(&exe).unwrap(), found);
        assert!(fx.runner.calls().is_empty());

        // Already linked: reused without running anything.
        platform.install(&PROFILE, fx.dir.path()).await.unwrap();
        assert!(fx.runner.calls().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_mac_install_replaces_dangling_link() {
        let bin = tempfile::tempdir().unwrap();
        let found = bin.path().join("arduino-cli");
        std::fs::write(&found, b"tool").unwrap();

        let fx = Fixture::new(FakeRunner::new().with_program("arduino-cli", &found));
        let exe = fx.exe(HostOs::MacOs);
        std::os::unix::fs::symlink(bin.path().join("gone"), &exe).unwrap();
        assert!(!exe.exists());

        fx.platform(HostOs::MacOs)
            .install(&PROFILE, fx.dir.path())
            .await
            .unwrap();
        assert_eq!(std::fs::read_link(&exe).unwrap(), found);
        assert!(exe.exists());
    }

    #[tokio::test]
    async fn test_mac_install_via_brew_failure_surfaces_step() {
        let fx = Fixture::new(
            FakeRunner::new()
                .with_program("brew", "/opt/homebrew/bin/brew")
                .failing_on("brew install"),
        );
        let platform = fx.platform(HostOs::MacOs);

        let err = platform.install(&PROFILE, fx.dir.path()).await.unwrap_err();
        match err {
            ToolchainError::StepFailed { step, .. } => assert_eq!(step, "brew install arduino-cli"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_reset_runs_all_steps_in_order() {
        let fx = Fixture::new(FakeRunner::new());
        std::fs::write(fx.exe(HostOs::Unix), b"").unwrap();
        let platform = fx.platform(HostOs::Unix);

        platform.reset(&PROFILE, fx.dir.path()).await.unwrap();

        let exe = fx.exe(HostOs::Unix);
        let mut expected = vec![format!("{} config init --overwrite", exe.display())];
        expected.extend(
            PROFILE
                .setup_steps
                .iter()
                .map(|step| format!("{} {}", exe.display(), step)),
        );
        assert_eq!(fx.runner.rendered(), expected);
    }

    #[tokio::test]
    async fn test_reset_is_repeatable() {
        let fx = Fixture::new(FakeRunner::new());
        std::fs::write(fx.exe(HostOs::Unix), b"").unwrap();
        let platform = fx.platform(HostOs::Unix);

        platform.reset(&PROFILE, fx.dir.path()).await.unwrap();
        let first = fx.runner.rendered();

        // Tool config now exists, so init is skipped on the second pass.
        let config = PROFILE.config_path(HostOs::Unix, fx.home.path());
        std::fs::create_dir_all(config.parent().unwrap()).unwrap();
        std::fs::write(&config, b"").unwrap();

        platform.reset(&PROFILE, fx.dir.path()).await.unwrap();
        let second = &fx.runner.rendered()[first.len()..];
        assert_eq!(second, &first[1..]);
    }

    #[tokio::test]
    async fn test_reset_stops_at_first_failing_step() {
        let fx = Fixture::new(FakeRunner::new().failing_on("lib install FastLED"));
        std::fs::write(fx.exe(HostOs::Windows), b"").unwrap();
        let platform = fx.platform(HostOs::Windows);

        let err = platform.reset(&PROFILE, fx.dir.path()).await.unwrap_err();
        match err {
            ToolchainError::StepFailed { step, stderr, .. } => {
                assert!(step.ends_with("lib install FastLED"));
                assert_eq!(stderr, "lib install FastLED failed");
            }
            other => panic!("unexpected error: {other}"),
        }

        let calls = fx.runner.rendered();
        assert!(calls.last().unwrap().ends_with("lib install FastLED"));
        assert!(!calls.iter().any(|c| c.contains("M5Core2")));
    }

    #[tokio::test]
    async fn test_reset_requires_installed_executable() {
        let fx = Fixture::new(FakeRunner::new());
        let platform = fx.platform(HostOs::MacOs);

        let err = platform.reset(&PROFILE, fx.dir.path()).await.unwrap_err();
        assert!(matches!(err, ToolchainError::ExecutableMissing(_)));
        assert!(fx.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_uninstall_removes_executable() {
        let fx = Fixture::new(FakeRunner::new());
        std::fs::write(fx.exe(HostOs::Unix), b"").unwrap();

        fx.platform(HostOs::Unix)
            .uninstall(&PROFILE, fx.dir.path())
            .await
            .unwrap();
        assert!(!fx.exe(HostOs::Unix).exists());

        // Nothing left to remove is not an error.
        fx.platform(HostOs::Unix)
            .uninstall(&PROFILE, fx.dir.path())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_mac_uninstall_removes_brew_package() {
        let fx = Fixture::new(
            FakeRunner::new()
                .with_program("brew", "/opt/homebrew/bin/brew")
                .with_program("arduino-cli", "/opt/homebrew/bin/arduino-cli"),
        );

        fx.platform(HostOs::MacOs)
            .uninstall(&PROFILE, fx.dir.path())
            .await
            .unwrap();
        assert_eq!(
            fx.runner.rendered(),
            vec!["brew uninstall arduino-cli --force --quiet".to_string()]
        );
    }
}
