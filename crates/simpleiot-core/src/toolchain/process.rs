//! External process invocation.
//!
//! Every install, reset, build and flash step is a shell command line run
//! through a [`CommandRunner`]. The system runner executes it; tests swap in a
//! recording runner.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::ToolchainError;

/// A shell command line plus the directory to run it in.
///
/// The argument string is passed through verbatim so callers can hand over
/// complete tool command lines (e.g. `compile -v -u -p /dev/ttyUSB0 ...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: String,
    cwd: Option<PathBuf>,
}

impl CommandLine {
    /// A raw command line with no separate program, e.g. a pipeline.
    pub fn shell(line: impl Into<String>) -> Self {
        Self {
            program: line.into(),
            args: String::new(),
            cwd: None,
        }
    }

    /// Invoke an executable with a literal argument string.
    pub fn tool(executable: &Path, args: impl Into<String>) -> Self {
        let program = executable.display().to_string();
        let program = if program.contains(char::is_whitespace) {
            format!("\"{}\"", program)
        } else {
            program
        };

        Self {
            program,
            args: args.into(),
            cwd: None,
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// The full line handed to the shell.
    pub fn render(&self) -> String {
        let args = self.args.trim();
        if args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, args)
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// How a command's output is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Inherit the terminal so the operator sees compiler/flasher output live
    Streamed,
    /// Collect stdout/stderr for error reporting
    Captured,
}

/// Result of a finished command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs command lines and looks up programs on PATH.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        command: &CommandLine,
        mode: OutputMode,
    ) -> Result<CommandOutput, ToolchainError>;

    /// Resolve a program name on PATH.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Runner backed by the host shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        command: &CommandLine,
        mode: OutputMode,
    ) -> Result<CommandOutput, ToolchainError> {
        let line = command.render();
        let mut cmd = shell_command(&line);
        if let Some(dir) = command.cwd() {
            cmd.current_dir(dir);
        }

        let spawn_error = |source| ToolchainError::Spawn {
            command: line.clone(),
            source,
        };

        match mode {
            OutputMode::Streamed => {
                let status = cmd
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await
                    .map_err(spawn_error)?;

                Ok(CommandOutput {
                    success: status.success(),
                    code: status.code(),
                    ..Default::default()
                })
            }
            OutputMode::Captured => {
                let output = cmd.output().await.map_err(spawn_error)?;

                Ok(CommandOutput {
                    success: output.status.success(),
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
        }
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").raw_arg(line);
    cmd
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

/// Run one captured step and turn a non-zero exit into [`ToolchainError::StepFailed`].
pub async fn run_step(
    runner: &dyn CommandRunner,
    command: &CommandLine,
) -> Result<CommandOutput, ToolchainError> {
    debug!(command = %command, "Exec");
    let output = runner.run(command, OutputMode::Captured).await?;

    if !output.success {
        return Err(ToolchainError::StepFailed {
            step: command.render(),
            status: output.status_text(),
            stderr: output.stderr.trim().to_string(),
        });
    }

    Ok(output)
}
