//! Toolchain identity types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between identity fields before the key is encoded.
pub const KEY_DELIMITER: &str = "::";

/// Derive the opaque registry key for an identity tuple.
///
/// The key is the lowercase hex encoding of
/// `manufacturer::processor::os::version`, so it doubles as a filesystem-safe
/// directory name and can always be reconstructed from the four fields.
pub fn make_key(manufacturer: &str, processor: &str, os: &str, version: &str) -> String {
    let joined = [manufacturer, processor, os, version].join(KEY_DELIMITER);
    hex::encode(joined.as_bytes())
}

/// Immutable identity of a build toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolSpec {
    manufacturer: String,
    processor: String,
    os: String,
    version: String,
}

impl ToolSpec {
    pub fn new(
        manufacturer: impl Into<String>,
        processor: impl Into<String>,
        os: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            processor: processor.into(),
            os: os.into(),
            version: version.into(),
        }
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn processor(&self) -> &str {
        &self.processor
    }

    /// Target firmware OS (e.g. "arduino"), not the host OS.
    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Opaque registry key, also used as the install directory name.
    pub fn key(&self) -> String {
        make_key(&self.manufacturer, &self.processor, &self.os, &self.version)
    }
}

impl fmt::Display for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}{d}{}",
            self.manufacturer,
            self.processor,
            self.os,
            self.version,
            d = KEY_DELIMITER
        )
    }
}

/// Where a toolchain is deployed. Only `Local` is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstallLocation {
    /// Local filesystem
    #[default]
    Local,
    /// Local Docker container
    Container,
    /// Remote container reached via API
    CloudContainer,
    /// Central cloud build service reached via API
    CloudService,
}

impl InstallLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallLocation::Local => "local",
            InstallLocation::Container => "container",
            InstallLocation::CloudContainer => "cloud_container",
            InstallLocation::CloudService => "cloud_service",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            InstallLocation::Local => "LOCAL",
            InstallLocation::Container => "CONTAINER",
            InstallLocation::CloudContainer => "CLOUD_CONTAINER",
            InstallLocation::CloudService => "CLOUD_SERVICE",
        }
    }
}

impl fmt::Display for InstallLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a toolchain claims it can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub can_compile: bool,
    pub can_flash: bool,
    pub can_compile_and_flash: bool,
}

impl Capabilities {
    pub const fn all() -> Self {
        Self {
            can_compile: true,
            can_flash: true,
            can_compile_and_flash: true,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}
