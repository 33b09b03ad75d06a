//! JSON-formatted output for CLI.

use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use super::OutputFormatter;
use simpleiot_core::toolchain::InstalledToolchain;
use simpleiot_core::{ToolSpec, ToolchainInstaller};

pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }

    fn to_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    fn toolchain_value(installer: &ToolchainInstaller) -> Value {
        let spec = installer.spec();
        json!({
            "alias": installer.alias(),
            "name": installer.name(),
            "description": installer.description(),
            "manufacturer": spec.manufacturer(),
            "processor": spec.processor(),
            "os": spec.os(),
            "version": spec.version(),
            "location": installer.location().as_str(),
            "key": installer.key(),
            "capabilities": installer.capabilities()
        })
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonOutput {
    fn format_toolchains(&self, installers: &[&ToolchainInstaller]) -> String {
        let items: Vec<Value> = installers
            .iter()
            .map(|installer| Self::toolchain_value(installer))
            .collect();

        Self::to_json(&json!({
            "toolchains": items,
            "count": installers.len()
        }))
    }

    fn format_installed(&self, base: &Path, installed: &[InstalledToolchain]) -> String {
        Self::to_json(&json!({
            "base": base,
            "installed": installed,
            "count": installed.len()
        }))
    }

    fn format_action(&self, action: &str, spec: &ToolSpec, path: Option<&Path>) -> String {
        Self::to_json(&json!({
            "action": action,
            "success": true,
            "spec": spec,
            "path": path
        }))
    }

    fn format_message(&self, message: &str) -> String {
        Self::to_json(&json!({ "message": message }))
    }
}
