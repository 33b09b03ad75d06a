//! Espressif ESP32 toolchain built on a local arduino-cli install.

use std::cmp::Ordering;
use std::path::Path;

use tracing::debug;

use super::host::HostOs;
use super::installer::ToolchainInstaller;
use super::profile::{HostPaths, ToolProfile};
use super::spec::{Capabilities, ToolSpec};

pub const ALIAS: &str = "esp32arloc";
pub const NAME: &str = "Espressif Esp32 Arduino Local";
pub const DESCRIPTION: &str = "Local Arduino-CLI install for ESP32 ArduinoCore";

pub const MANUFACTURER: &str = "espressif";
pub const PROCESSOR: &str = "esp32";
pub const OS: &str = "arduino";

/// Latest known ESP32 toolchain (esptool) version. This is not the
/// arduino-cli version.
pub const LATEST_TOOLCHAIN_VERSION: &str = "4.2.1";

/// Board name for the M5Stack Core2 demo device.
pub const DEFAULT_FQBN: &str = "esp32:esp32:m5stack-core2";

pub const PROFILE: ToolProfile = ToolProfile {
    executable: "arduino-cli",
    brew_formula: "arduino-cli",
    windows_archive_url:
        "https://downloads.arduino.cc/arduino-cli/arduino-cli_latest_Windows_64bit.zip",
    install_script_url: "https://raw.githubusercontent.com/arduino/arduino-cli/master/install.sh",
    data_dir: HostPaths {
        mac: "Library/Arduino15",
        windows: "AppData/Local/Arduino15",
        unix: ".arduino15",
    },
    config_file: "arduino-cli.yaml",
    config_init: Some("config init --overwrite"),
    setup_steps: &[
        "config set board_manager.additional_urls https://raw.githubusercontent.com/espressif/arduino-esp32/gh-pages/package_esp32_index.json",
        "config set library.enable_unsafe_install true",
        "core update-index",
        "core install esp32:esp32",
        "lib install ArduinoJson",
        "lib install ArduinoMqttClient",
        "lib install FastLED",
        "lib install --git-url https://github.com/Tinyu-Zhao/TinyGPSPlus-ESP32.git",
        "lib install --git-url https://github.com/m5stack/M5Core2.git",
        "lib install --git-url https://github.com/m5stack/M5Unit-ENV.git",
        "lib install --git-url https://github.com/m5stack/UNIT_ENCODER.git",
        "lib install --git-url https://github.com/aws-samples/arduino-aws-greengrass-iot.git",
        "lib install --git-url https://github.com/awslabs/simpleiot-arduino.git",
    ],
    flash_utility: "esptool",
};

/// Build the installer for a given toolchain version.
pub fn installer(version: &str, host: HostOs) -> ToolchainInstaller {
    ToolchainInstaller::new(
        ToolSpec::new(MANUFACTURER, PROCESSOR, OS, version),
        ALIAS,
        NAME,
        DESCRIPTION,
        PROFILE,
        host,
    )
    .with_capabilities(Capabilities::all())
}

/// Version to register: the newest installed esptool if any, else `default_version`.
pub fn resolve_version(host: HostOs, home: &Path, default_version: &str) -> String {
    let candidates = candidate_versions(host, home, default_version);
    debug!(?candidates, "Toolchain version candidates");
    candidates
        .into_iter()
        .next()
        .unwrap_or_else(|| default_version.to_string())
}

/// Installed esptool versions newest first, followed by `default_version`
/// when it is not among them.
pub fn candidate_versions(host: HostOs, home: &Path, default_version: &str) -> Vec<String> {
    let mut versions = PROFILE.installed_versions(host, home);
    versions.sort_by(|a, b| compare_versions(b, a));
    if !versions.iter().any(|v| v == default_version) {
        versions.push(default_version.to_string());
    }
    versions
}

fn compare_versions(a: &str, b: &str) -> Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
