//! Build toolchain management.
//!
//! A toolchain is identified by a [`ToolSpec`] and installed by a
//! [`ToolchainInstaller`]. The [`ToolchainRegistry`] maps spec keys to
//! installers and dispatches each operation to the executor for the host OS.

pub mod esp32_arduino;
pub mod fetch;
pub mod host;
pub mod installer;
pub mod platform;
pub mod process;
pub mod profile;
pub mod registry;
pub mod spec;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{ArchiveFetcher, HttpFetcher};
pub use host::HostOs;
pub use installer::ToolchainInstaller;
pub use process::{CommandLine, CommandOutput, CommandRunner, OutputMode, SystemRunner};
pub use profile::ToolProfile;
pub use registry::{AliasTarget, InstalledToolchain, ToolchainRegistry};
pub use spec::{make_key, Capabilities, InstallLocation, ToolSpec};
