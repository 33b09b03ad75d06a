//! Error types for SimpleIOT core.

use std::path::PathBuf;

use thiserror::Error;

use crate::toolchain::InstallLocation;

/// Core error type for shared operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Toolchain error: {0}")]
    Toolchain(#[from] ToolchainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Toolchain lookup, install and invocation errors
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("Toolchain alias '{0}' not recognized")]
    AliasNotFound(String),

    #[error("No toolchain registered for {spec}")]
    NotFound { spec: String },

    #[error("Toolchain alias '{alias}' is already registered for {existing}")]
    DuplicateAlias { alias: String, existing: String },

    #[error("Operating system not supported: {0}")]
    UnsupportedHost(String),

    #[error("Install location '{0}' is not supported, only local installs are available")]
    UnsupportedLocation(InstallLocation),

    #[error("Toolchain '{alias}' cannot {action}")]
    CapabilityMissing { alias: String, action: &'static str },

    #[error("{name} has to be installed ({hint})")]
    PrerequisiteMissing { name: String, hint: String },

    #[error("Toolchain app already exists at path: {}", .0.display())]
    AlreadyInstalled(PathBuf),

    #[error("Build tool not found at {}. Please uninstall then re-install.", .0.display())]
    ExecutableMissing(PathBuf),

    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Step '{step}' failed ({status}): {stderr}")]
    StepFailed {
        step: String,
        status: String,
        stderr: String,
    },

    #[error("Download of {url} failed: {message}")]
    Download { url: String, message: String },

    #[error("Invalid archive: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolchainError {
    /// True for errors caused by the caller's request or registry contents
    /// rather than by the host environment.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ToolchainError::AliasNotFound(_)
                | ToolchainError::NotFound { .. }
                | ToolchainError::DuplicateAlias { .. }
                | ToolchainError::UnsupportedHost(_)
                | ToolchainError::UnsupportedLocation(_)
                | ToolchainError::CapabilityMissing { .. }
        )
    }

    /// True when the operator has to fix the environment before retrying.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ToolchainError::PrerequisiteMissing { .. }
                | ToolchainError::AlreadyInstalled(_)
                | ToolchainError::ExecutableMissing(_)
        )
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
