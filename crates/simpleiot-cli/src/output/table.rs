//! Table-formatted output for CLI.

use std::path::Path;

use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use super::OutputFormatter;
use simpleiot_core::toolchain::InstalledToolchain;
use simpleiot_core::{ToolSpec, ToolchainInstaller};

pub struct TableOutput;

impl TableOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TableOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TableOutput {
    fn format_toolchains(&self, installers: &[&ToolchainInstaller]) -> String {
        if installers.is_empty() {
            return "No toolchains available.".to_string();
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Alias", "Name", "Mfr", "Proc", "OS", "Version", "Location"]);

        for installer in installers {
            let spec = installer.spec();
            table.add_row(vec![
                Cell::new(installer.alias()).fg(Color::Cyan),
                Cell::new(installer.name()),
                Cell::new(spec.manufacturer()),
                Cell::new(spec.processor()),
                Cell::new(spec.os()),
                Cell::new(spec.version()),
                Cell::new(installer.location().display_name()),
            ]);
        }

        table.to_string()
    }

    fn format_installed(&self, base: &Path, installed: &[InstalledToolchain]) -> String {
        if installed.is_empty() {
            return format!("No toolchains installed under {}.", base.display());
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Alias", "Mfr", "Proc", "OS", "Version", "Executable", "Path"]);

        for item in installed {
            let executable = if item.executable_present {
                Cell::new("OK").fg(Color::Green)
            } else {
                Cell::new("MISSING").fg(Color::Red)
            };

            table.add_row(vec![
                Cell::new(&item.alias),
                Cell::new(item.spec.manufacturer()),
                Cell::new(item.spec.processor()),
                Cell::new(item.spec.os()),
                Cell::new(item.spec.version()),
                executable,
                Cell::new(item.path.display()),
            ]);
        }

        format!("{}\n\nFound {} installed toolchain(s)", table, installed.len())
    }

    fn format_action(&self, action: &str, spec: &ToolSpec, path: Option<&Path>) -> String {
        let status = "[OK]".green();
        match path {
            Some(path) => format!("{} {} {} ({})", status, action, spec, path.display()),
            None => format!("{} {} {}", status, action, spec),
        }
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}
