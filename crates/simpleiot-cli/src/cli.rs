//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use simpleiot_core::toolchain::esp32_arduino::DEFAULT_FQBN;
use simpleiot_core::InstallLocation;

/// SimpleIOT CLI - toolchain and firmware management for SimpleIOT devices
#[derive(Parser, Debug)]
#[command(name = "iot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (detailed step trace on stderr)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build toolchain management
    Toolchain(ToolchainArgs),

    /// Compile and flash device firmware
    Firmware(FirmwareArgs),
}

// ==================== Toolchain ====================

#[derive(Args, Debug)]
pub struct ToolchainArgs {
    #[command(subcommand)]
    pub command: ToolchainCommands,
}

#[derive(Subcommand, Debug)]
pub enum ToolchainCommands {
    /// Install a toolchain, then configure it
    Install(TargetArgs),

    /// Uninstall a toolchain and remove its directory
    Uninstall(TargetArgs),

    /// Restore an installed toolchain's configuration
    Reset(TargetArgs),

    /// List every toolchain this CLI can install
    Available,

    /// List toolchains installed under the base directory
    List(BaseArgs),

    /// Update an installed toolchain (not available yet)
    Update(TargetArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct BaseArgs {
    /// Base directory of installed toolchains [default: ~/.simpleiot/_toolchain]
    #[arg(long, alias = "path", env = "SIMPLEIOT_TOOLCHAIN_BASE")]
    pub base: Option<PathBuf>,
}

/// Which toolchain to act on: an alias, or an identity tuple.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    #[command(flatten)]
    pub base: BaseArgs,

    /// Toolchain alias, e.g. esp32arloc (overrides the identity flags)
    #[arg(long)]
    pub alias: Option<String>,

    /// Manufacturer name
    #[arg(long, alias = "brand", default_value = "espressif")]
    pub manufacturer: String,

    /// Processor type
    #[arg(long, alias = "cpu", default_value = "esp32")]
    pub processor: String,

    /// Target firmware operating system
    #[arg(long = "os", default_value = "arduino")]
    pub os: String,

    /// Toolchain version [default: newest installed, else the latest known]
    #[arg(long)]
    pub version: Option<String>,

    /// Install location type
    #[arg(long, value_enum, default_value_t = LocationArg::Local)]
    pub location: LocationArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationArg {
    Local,
    Container,
    CloudContainer,
    CloudService,
}

impl From<LocationArg> for InstallLocation {
    fn from(arg: LocationArg) -> Self {
        match arg {
            LocationArg::Local => InstallLocation::Local,
            LocationArg::Container => InstallLocation::Container,
            LocationArg::CloudContainer => InstallLocation::CloudContainer,
            LocationArg::CloudService => InstallLocation::CloudService,
        }
    }
}

// ==================== Firmware ====================

#[derive(Args, Debug)]
pub struct FirmwareArgs {
    #[command(subcommand)]
    pub command: FirmwareCommands,
}

#[derive(Subcommand, Debug)]
pub enum FirmwareCommands {
    /// Compile a sketch
    Build(FirmwareBuildArgs),

    /// Compile a sketch and upload it to a device
    Flash(FirmwareFlashArgs),

    /// Upload an already compiled sketch to a device
    Upload(FirmwareUploadArgs),
}

#[derive(Args, Debug)]
pub struct FirmwareBuildArgs {
    /// Source directory containing the sketch folder
    #[arg(long)]
    pub dir: PathBuf,

    /// Fully qualified board name
    #[arg(long, default_value = DEFAULT_FQBN)]
    pub fqbn: String,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Debug)]
pub struct FirmwareFlashArgs {
    /// Source directory containing the sketch folder
    #[arg(long, conflicts_with = "zip", required_unless_present = "zip")]
    pub dir: Option<PathBuf>,

    /// Source zip archive containing the sketch folder
    #[arg(long)]
    pub zip: Option<PathBuf>,

    /// Serial port of the device
    #[arg(long)]
    pub port: String,

    /// Fully qualified board name
    #[arg(long, default_value = DEFAULT_FQBN)]
    pub fqbn: String,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Debug)]
pub struct FirmwareUploadArgs {
    /// Source directory containing the compiled sketch folder
    #[arg(long)]
    pub dir: PathBuf,

    /// Serial port of the device
    #[arg(long)]
    pub port: String,

    /// Fully qualified board name
    #[arg(long, default_value = DEFAULT_FQBN)]
    pub fqbn: String,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_install_defaults() {
        let cli = Cli::try_parse_from(["iot", "toolchain", "install"]).unwrap();
        let Commands::Toolchain(ToolchainArgs {
            command: ToolchainCommands::Install(target),
        }) = cli.command
        else {
            panic!("expected toolchain install");
        };

        assert_eq!(target.manufacturer, "espressif");
        assert_eq!(target.processor, "esp32");
        assert_eq!(target.os, "arduino");
        assert_eq!(target.version, None);
        assert_eq!(target.location, LocationArg::Local);
        assert!(target.alias.is_none());
    }

    #[test]
    fn test_identity_flag_aliases() {
        let cli = Cli::try_parse_from([
            "iot", "toolchain", "reset", "--path", "/tmp/tc", "--brand", "acme", "--cpu", "m0",
            "--version", "1.0.0", "--location", "cloud-service", "--json",
        ])
        .unwrap();
        assert!(cli.json);

        let Commands::Toolchain(ToolchainArgs {
            command: ToolchainCommands::Reset(target),
        }) = cli.command
        else {
            panic!("expected toolchain reset");
        };
        assert_eq!(target.base.base, Some(PathBuf::from("/tmp/tc")));
        assert_eq!(target.manufacturer, "acme");
        assert_eq!(target.processor, "m0");
        assert_eq!(target.version.as_deref(), Some("1.0.0"));
        assert_eq!(
            InstallLocation::from(target.location),
            InstallLocation::CloudService
        );
    }

    #[test]
    fn test_flash_requires_a_source() {
        assert!(Cli::try_parse_from(["iot", "firmware", "flash", "--port", "/dev/ttyUSB0"]).is_err());
        assert!(Cli::try_parse_from([
            "iot", "firmware", "flash", "--port", "/dev/ttyUSB0", "--dir", "a", "--zip", "b.zip",
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "iot", "firmware", "flash", "--port", "/dev/ttyUSB0", "--zip", "b.zip",
        ])
        .unwrap();
        let Commands::Firmware(FirmwareArgs {
            command: FirmwareCommands::Flash(args),
        }) = cli.command
        else {
            panic!("expected firmware flash");
        };
        assert_eq!(args.zip, Some(PathBuf::from("b.zip")));
        assert_eq!(args.fqbn, "esp32:esp32:m5stack-core2");
    }
}
