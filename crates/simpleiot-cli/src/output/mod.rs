//! Output formatting for CLI results.

pub mod json;
pub mod table;

pub use json::JsonOutput;
pub use table::TableOutput;

use std::path::Path;

use simpleiot_core::toolchain::InstalledToolchain;
use simpleiot_core::{ToolSpec, ToolchainInstaller};

/// Output formatter trait
pub trait OutputFormatter {
    /// Format the registered toolchains
    fn format_toolchains(&self, installers: &[&ToolchainInstaller]) -> String;

    /// Format toolchains installed under `base`
    fn format_installed(&self, base: &Path, installed: &[InstalledToolchain]) -> String;

    /// Format a completed toolchain or firmware action
    fn format_action(&self, action: &str, spec: &ToolSpec, path: Option<&Path>) -> String;

    /// Format a generic message
    fn format_message(&self, message: &str) -> String;
}

/// Get the appropriate formatter based on JSON flag
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonOutput::new())
    } else {
        Box::new(TableOutput::new())
    }
}
