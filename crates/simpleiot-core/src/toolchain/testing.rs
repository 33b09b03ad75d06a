//! Recording fakes for runner and fetcher.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::fetch::ArchiveFetcher;
use super::process::{CommandLine, CommandOutput, CommandRunner, OutputMode};
use crate::error::ToolchainError;

/// Build an in-memory zip with the given `(path, contents)` entries.
pub(crate) fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Records every command instead of running it.
#[derive(Default)]
pub(crate) struct FakeRunner {
    calls: Mutex<Vec<(CommandLine, OutputMode)>>,
    programs: HashMap<String, PathBuf>,
    fail_on: Option<String>,
    creates: Option<PathBuf>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `program` as present on PATH at `path`.
    pub fn with_program(mut self, program: &str, path: impl Into<PathBuf>) -> Self {
        self.programs.insert(program.to_string(), path.into());
        self
    }

    /// Exit non-zero for any command line containing `pattern`.
    pub fn failing_on(mut self, pattern: &str) -> Self {
        self.fail_on = Some(pattern.to_string());
        self
    }

    /// Write an empty file at `path` whenever a command succeeds.
    pub fn creating(mut self, path: impl Into<PathBuf>) -> Self {
        self.creates = Some(path.into());
        self
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(line, _)| line.clone())
            .collect()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.calls().iter().map(CommandLine::render).collect()
    }

    pub fn modes(&self) -> Vec<OutputMode> {
        self.calls.lock().unwrap().iter().map(|(_, mode)| *mode).collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(
        &self,
        command: &CommandLine,
        mode: OutputMode,
    ) -> Result<CommandOutput, ToolchainError> {
        self.calls.lock().unwrap().push((command.clone(), mode));

        let rendered = command.render();
        if let Some(pattern) = &self.fail_on {
            if rendered.contains(pattern.as_str()) {
                return Ok(CommandOutput {
                    success: false,
                    code: Some(1),
                    stdout: String::new(),
                    stderr: format!("{} failed\n", pattern),
                });
            }
        }

        if let Some(path) = &self.creates {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, b"")?;
        }

        Ok(CommandOutput {
            success: true,
            code: Some(0),
            ..Default::default()
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.programs.get(program).cloned()
    }
}

/// Serves a fixed archive for every URL.
pub(crate) struct FakeFetcher {
    archive: Mutex<Vec<u8>>,
    urls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn serving(archive: Vec<u8>) -> Self {
        Self {
            archive: Mutex::new(archive),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_archive(&self, archive: Vec<u8>) {
        *self.archive.lock().unwrap() = archive;
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArchiveFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), ToolchainError> {
        self.urls.lock().unwrap().push(url.to_string());
        let bytes = self.archive.lock().unwrap().clone();
        std::fs::write(dest, bytes)?;
        Ok(())
    }
}
