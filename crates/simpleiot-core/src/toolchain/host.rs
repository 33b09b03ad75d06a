//! Host operating system detection.
//!
//! The host OS picks which platform executor runs an operation. It is a
//! different axis from [`ToolSpec::os`](super::ToolSpec::os), which names the
//! target firmware OS.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ToolchainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostOs {
    MacOs,
    Windows,
    /// Linux and the other POSIX hosts served by script installs
    Unix,
}

impl HostOs {
    /// Detect the OS this process runs on.
    pub fn detect() -> Result<Self, ToolchainError> {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value to a supported host.
    pub fn from_os_name(name: &str) -> Result<Self, ToolchainError> {
        match name {
            "macos" => Ok(HostOs::MacOs),
            "windows" => Ok(HostOs::Windows),
            "linux" | "freebsd" | "netbsd" | "openbsd" | "dragonfly" => Ok(HostOs::Unix),
            other => Err(ToolchainError::UnsupportedHost(other.to_string())),
        }
    }

    /// Platform-specific file name for an executable.
    pub fn executable_name(&self, base: &str) -> String {
        match self {
            HostOs::Windows => format!("{}.exe", base),
            HostOs::MacOs | HostOs::Unix => base.to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HostOs::MacOs => "macos",
            HostOs::Windows => "windows",
            HostOs::Unix => "unix",
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
