//! Firmware build and flash commands.
//!
//! A firmware source is a directory (or zip archive) whose first subdirectory
//! is the Arduino sketch; the sketch folder and its `.ino` file share a name.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use super::resolve_target;
use crate::cli::{
    FirmwareArgs, FirmwareBuildArgs, FirmwareCommands, FirmwareFlashArgs, FirmwareUploadArgs,
};
use crate::error::CliError;
use crate::output::get_formatter;
use simpleiot_core::toolchain::fetch;
use simpleiot_core::ToolchainRegistry;

/// Run a firmware command
pub async fn run_firmware(
    args: FirmwareArgs,
    registry: &mut ToolchainRegistry,
    json: bool,
) -> Result<(), CliError> {
    match args.command {
        FirmwareCommands::Build(args) => run_build(args, registry, json).await,
        FirmwareCommands::Flash(args) => run_flash(args, registry, json).await,
        FirmwareCommands::Upload(args) => run_upload(args, registry, json).await,
    }
}

async fn run_build(
    args: FirmwareBuildArgs,
    registry: &mut ToolchainRegistry,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let target = resolve_target(registry, &args.target)?;
    let source = SketchSource::from_dir(&args.dir)?;
    let sketch = find_sketch_dir(source.root())?;

    if !json {
        eprintln!("Building {}...", sketch.display());
    }

    let command = build_command(&args.fqbn, &sketch);
    let ok = registry
        .build(&target.base, &target.spec, &sketch, &command)
        .await?;
    if !ok {
        return Err(CliError::ToolFailed {
            action: "Build".to_string(),
        });
    }

    println!("{}", formatter.format_action("Built", &target.spec, Some(&sketch)));
    Ok(())
}

async fn run_flash(
    args: FirmwareFlashArgs,
    registry: &mut ToolchainRegistry,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let target = resolve_target(registry, &args.target)?;
    let source = SketchSource::prepare(args.dir.as_deref(), args.zip.as_deref())?;
    let sketch = find_sketch_dir(source.root())?;

    if !json {
        eprintln!("Building and flashing {} to {}...", sketch.display(), args.port);
    }

    let command = flash_command(&args.port, &args.fqbn, &sketch);
    let ok = registry
        .build_and_flash(&target.base, &target.spec, &sketch, &command)
        .await?;
    if !ok {
        return Err(CliError::ToolFailed {
            action: "Flash".to_string(),
        });
    }

    let action = format!("Flashed {} with", args.port);
    println!("{}", formatter.format_action(&action, &target.spec, None));
    Ok(())
}

async fn run_upload(
    args: FirmwareUploadArgs,
    registry: &mut ToolchainRegistry,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let target = resolve_target(registry, &args.target)?;
    let source = SketchSource::from_dir(&args.dir)?;
    let sketch = find_sketch_dir(source.root())?;

    if !json {
        eprintln!("Uploading {} to {}...", sketch.display(), args.port);
    }

    let command = upload_command(&args.port, &args.fqbn, &sketch);
    let ok = registry
        .flash(&target.base, &target.spec, &sketch, &command)
        .await?;
    if !ok {
        return Err(CliError::ToolFailed {
            action: "Upload".to_string(),
        });
    }

    let action = format!("Uploaded to {} with", args.port);
    println!("{}", formatter.format_action(&action, &target.spec, None));
    Ok(())
}

pub fn build_command(fqbn: &str, sketch: &Path) -> String {
    format!("compile -v --fqbn {} {}", fqbn, sketch.display())
}

pub fn flash_command(port: &str, fqbn: &str, sketch: &Path) -> String {
    format!("compile -v -u -p {} --fqbn {} {}", port, fqbn, sketch.display())
}

pub fn upload_command(port: &str, fqbn: &str, sketch: &Path) -> String {
    format!("upload -p {} --fqbn {} {}", port, fqbn, sketch.display())
}

/// Firmware source root. Zip sources live in a scratch directory that is
/// removed on drop.
#[derive(Debug)]
struct SketchSource {
    root: PathBuf,
    _scratch: Option<TempDir>,
}

impl SketchSource {
    fn prepare(dir: Option<&Path>, zip: Option<&Path>) -> Result<Self, CliError> {
        match (dir, zip) {
            (_, Some(archive)) => Self::from_zip(archive),
            (Some(dir), None) => Self::from_dir(dir),
            (None, None) => Err(CliError::InvalidArgument(
                "Either --dir or --zip is required".to_string(),
            )),
        }
    }

    fn from_dir(dir: &Path) -> Result<Self, CliError> {
        if !dir.is_dir() {
            return Err(CliError::InvalidArgument(format!(
                "Source directory not found: {}",
                dir.display()
            )));
        }

        // The tool runs inside the sketch, so a relative path would no
        // longer resolve.
        let root = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            std::env::current_dir()?.join(dir)
        };

        Ok(Self {
            root,
            _scratch: None,
        })
    }

    fn from_zip(archive: &Path) -> Result<Self, CliError> {
        if !archive.is_file() {
            return Err(CliError::InvalidArgument(format!(
                "Source zip file not found: {}",
                archive.display()
            )));
        }

        let scratch = tempfile::Builder::new().prefix("iot").tempdir()?;
        debug!(archive = %archive.display(), dest = %scratch.path().display(), "Extracting firmware source");
        fetch::extract_all(archive, scratch.path())?;

        Ok(Self {
            root: scratch.path().to_path_buf(),
            _scratch: Some(scratch),
        })
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

/// First visible subdirectory of `source`, by name.
pub fn find_sketch_dir(source: &Path) -> Result<PathBuf, CliError> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(source)?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .collect();
    dirs.sort();

    dirs.into_iter().next().ok_or_else(|| {
        CliError::InvalidArgument(format!(
            "Could not locate sketch root in {}. Invalid template layout.",
            source.display()
        ))
    })
}
