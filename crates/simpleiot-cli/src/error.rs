//! Error types for SimpleIOT CLI.
//!
//! CliError wraps CoreError from the shared library and adds CLI-specific variants.

use simpleiot_core::error::CoreError;
use simpleiot_core::ToolchainError;
use thiserror::Error;

/// Exit codes for the CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NETWORK_ERROR: i32 = 2;
    pub const TOOLCHAIN_ERROR: i32 = 3;
    pub const INVALID_ARGS: i32 = 4;
    pub const PRECONDITION_FAILED: i32 = 6;
}

/// Main error type for the CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{action} failed: the toolchain exited with an error")]
    ToolFailed { action: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(e) => match e {
                CoreError::Toolchain(e) => toolchain_exit_code(e),
                CoreError::Io(_) => exit_codes::GENERAL_ERROR,
                CoreError::Other(_) => exit_codes::GENERAL_ERROR,
            },
            CliError::Io(_) => exit_codes::GENERAL_ERROR,
            CliError::InvalidArgument(_) => exit_codes::INVALID_ARGS,
            CliError::ToolFailed { .. } => exit_codes::TOOLCHAIN_ERROR,
        }
    }
}

fn toolchain_exit_code(e: &ToolchainError) -> i32 {
    if e.is_configuration() {
        return exit_codes::INVALID_ARGS;
    }
    if e.is_precondition() {
        return exit_codes::PRECONDITION_FAILED;
    }
    match e {
        ToolchainError::Download { .. } => exit_codes::NETWORK_ERROR,
        ToolchainError::StepFailed { .. } | ToolchainError::Spawn { .. } => {
            exit_codes::TOOLCHAIN_ERROR
        }
        _ => exit_codes::GENERAL_ERROR,
    }
}

impl From<ToolchainError> for CliError {
    fn from(e: ToolchainError) -> Self {
        CliError::Core(CoreError::Toolchain(e))
    }
}
