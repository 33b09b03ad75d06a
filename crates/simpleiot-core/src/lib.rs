//! SimpleIOT core library.
//!
//! Build toolchain registry, per-host installers and the process plumbing used
//! to compile and flash device firmware. Consumed by the `iot` CLI.

pub mod error;
pub mod paths;
pub mod toolchain;

pub use error::{CoreError, ToolchainError};
pub use toolchain::{
    HostOs, InstallLocation, ToolSpec, ToolchainInstaller, ToolchainRegistry,
};
