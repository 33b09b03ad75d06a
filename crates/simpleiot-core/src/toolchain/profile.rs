//! Per-tool configuration consumed by the platform executors.
//!
//! A concrete toolchain is described by data (executable name, download
//! locations, package formula, setup steps) rather than code, so the same
//! per-host executor installs any tool that fits the shape.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::host::HostOs;

/// A path relative to the home directory, chosen per host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPaths {
    pub mac: &'static str,
    pub windows: &'static str,
    pub unix: &'static str,
}

impl HostPaths {
    pub fn for_host(&self, host: HostOs) -> &'static str {
        match host {
            HostOs::MacOs => self.mac,
            HostOs::Windows => self.windows,
            HostOs::Unix => self.unix,
        }
    }

    pub fn resolve(&self, host: HostOs, home: &Path) -> PathBuf {
        self.for_host(host)
            .split('/')
            .fold(home.to_path_buf(), |path, part| path.join(part))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolProfile {
    /// Executable base name, without any `.exe` suffix
    pub executable: &'static str,
    /// Homebrew formula used on macOS
    pub brew_formula: &'static str,
    /// Release zip used on Windows
    pub windows_archive_url: &'static str,
    /// Install script used on other POSIX hosts; run with `BINDIR` set
    pub install_script_url: &'static str,
    /// Tool data directory holding its config file and package cache
    pub data_dir: HostPaths,
    /// Config file name inside the data directory
    pub config_file: &'static str,
    /// Arguments creating the config file, run only when it is missing
    pub config_init: Option<&'static str>,
    /// Argument strings run in order by reset
    pub setup_steps: &'static [&'static str],
    /// Flashing utility bundled in the data directory, used for version discovery
    pub flash_utility: &'static str,
}

impl ToolProfile {
    pub fn executable_for(&self, host: HostOs) -> String {
        host.executable_name(self.executable)
    }

    pub fn data_dir(&self, host: HostOs, home: &Path) -> PathBuf {
        self.data_dir.resolve(host, home)
    }

    pub fn config_path(&self, host: HostOs, home: &Path) -> PathBuf {
        self.data_dir(host, home).join(self.config_file)
    }

    pub fn brew_install_command(&self) -> String {
        format!("brew install {}", self.brew_formula)
    }

    pub fn brew_uninstall_command(&self) -> String {
        format!("brew uninstall {} --force --quiet", self.brew_formula)
    }

    /// Pipeline that downloads the install script and installs into `bindir`.
    pub fn install_script_command(&self, bindir: &Path) -> String {
        format!(
            "curl -fsSL {} | BINDIR={} sh",
            self.install_script_url,
            shell_quote(&bindir.display().to_string())
        )
    }

    /// Versions of the bundled flashing utility found under the data directory.
    ///
    /// Each copy lives in a directory named after its version, e.g.
    /// `Arduino15/packages/esp32/tools/esptool_py/4.2.1/esptool`. Sorted and
    /// deduplicated; empty if nothing is installed.
    pub fn installed_versions(&self, host: HostOs, home: &Path) -> Vec<String> {
        let utility = host.executable_name(self.flash_utility);

        let mut versions: Vec<String> = WalkDir::new(self.data_dir(host, home))
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file() && entry.file_name() == utility.as_str())
            .filter_map(|entry| {
                entry
                    .path()
                    .parent()
                    .and_then(|parent| parent.file_name())
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .collect();

        versions.sort();
        versions.dedup();
        versions
    }
}

/// Single-quote `value` for `sh`; embedded quotes become `'\''`.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::esp32_arduino::PROFILE;

    #[test]
    fn test_data_dir_per_host() {
        let home = Path::new("/home/op");
        assert_eq!(
            PROFILE.data_dir(HostOs::MacOs, home),
            PathBuf::from("/home/op/Library/Arduino15")
        );
        assert_eq!(
            PROFILE.config_path(HostOs::Unix, home),
            PathBuf::from("/home/op/.arduino15/arduino-cli.yaml")
        );
        assert_eq!(
            PROFILE.data_dir(HostOs::Windows, home),
            home.join("AppData").join("Local").join("Arduino15")
        );
    }

    #[test]
    fn test_install_script_command() {
        let cmd = PROFILE.install_script_command(Path::new("/tmp/tc/abc"));
        assert_eq!(
            cmd,
            "curl -fsSL https://raw.githubusercontent.com/arduino/arduino-cli/master/install.sh | BINDIR='/tmp/tc/abc' sh"
        );
    }

    #[test]
    fn test_install_script_command_quotes_bindir() {
        let cmd = PROFILE.install_script_command(Path::new("/Users/op/Simple IoT/tc;rm"));
        assert!(cmd.ends_with("| BINDIR='/Users/op/Simple IoT/tc;rm' sh"));

        let cmd = PROFILE.install_script_command(Path::new("/home/o'brien/tc"));
        assert!(cmd.ends_with(r#"| BINDIR='/home/o'\''brien/tc' sh"#));
    }

    #[test]
    fn test_installed_versions_scan() {
        let home = tempfile::tempdir().unwrap();
        let tools = home
            .path()
            .join("Library/Arduino15/packages/esp32/tools/esptool_py");
        for version in ["4.2.1", "3.3.0"] {
            std::fs::create_dir_all(tools.join(version)).unwrap();
            std::fs::write(tools.join(version).join("esptool"), b"").unwrap();
        }
        // Not the utility itself
        std::fs::write(tools.join("4.2.1").join("esptool.py"), b"").unwrap();

        let versions = PROFILE.installed_versions(HostOs::MacOs, home.path());
        assert_eq!(versions, vec!["3.3.0".to_string(), "4.2.1".to_string()]);
    }

    #[test]
    fn test_installed_versions_missing_dir() {
        let home = tempfile::tempdir().unwrap();
        assert!(PROFILE.installed_versions(HostOs::Unix, home.path()).is_empty());
    }
}
