//! Command line argument parsing and validation.

use crate::bundler::{
    Arch, BuildType, SkipFlags, VsVersion, platform::windows::SignKind, qt::QtRelease,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::{fmt::Display, path::PathBuf, str::FromStr};

/// Build, install, package, sign and deploy native projects
#[derive(Parser, Debug)]
#[command(
    name = "packtree",
    version,
    about = "Build, install, package, sign and deploy native projects",
    long_about = "Drives CMake, the native build tools, the Qt runtime deployment, the WiX
toolset and the signing command over a JSON project tree.

Usage:
  packtree build -p packaging/Win/suite --arch x64 --rev 4711 --sign
  packtree tree -p suite
  packtree cmake --arch x86 --arch x64 -m
  packtree msi suite.msi --arch x64 --rev 1.2.3.4711

Exit code 0 = every requested step succeeded."
)]
pub struct Args {
    /// Workspace root (default: nearest directory with packtree.toml or packaging/)
    #[arg(long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Tool configuration file (default: <workspace>/packtree.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub tool_config: Option<PathBuf>,

    /// Be more verbose
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Walk the project tree of a package: build, install, package, sign, deploy
    Build(BuildArgs),

    /// Print the project tree of a package
    Tree(TreeArgs),

    /// Configure and build a CMake project
    Cmake(CMakeArgs),

    /// Copy the Qt runtime next to an application
    DeployQt(DeployQtArgs),

    /// Harvest, compile and link a WiX installer
    Msi(MsiArgs),

    /// Sign files with the configured signing command
    Sign(SignArgs),

    /// Rename a file to carry the product version
    Versionize(VersionizeArgs),

    /// Print a WiX include defining PRODUCT_VERSION
    VersionWxi(VersionWxiArgs),
}

#[derive(ClapArgs, Debug)]
pub struct BuildArgs {
    /// Package to build (its file name is the project looked up in the tree)
    #[arg(short, long = "package", value_name = "PATH")]
    pub package_path: PathBuf,

    /// Base directory of the per-package configuration
    #[arg(long, value_name = "DIR")]
    pub package_base_dir: Option<PathBuf>,

    /// Override the installer file name
    #[arg(long, alias = "setup_name", value_name = "NAME")]
    pub setup_name: Option<String>,

    /// Deployment directory, relative to the workspace
    #[arg(long, value_name = "DIR")]
    pub deploy_to: Option<PathBuf>,

    /// Install prefix (CMAKE_INSTALL_PREFIX)
    #[arg(long, alias = "install_prefix", default_value = "tmp/build_dir", value_name = "DIR")]
    pub install_prefix: PathBuf,

    /// Sign the package
    #[arg(long)]
    pub sign: bool,

    #[command(flatten)]
    pub skip: SkipArgs,

    /// Processor architecture
    #[arg(short, long, default_value = "x64", value_parser = parse_value::<Arch>)]
    pub arch: Arch,

    /// Revision number of the build
    #[arg(long, default_value = "1234")]
    pub rev: String,

    /// Build type (Release, Debug, RelWithDebInfo, coverage)
    #[arg(long, alias = "build_type", alias = "bt", default_value = "Release", value_parser = parse_value::<BuildType>)]
    pub build_type: BuildType,

    /// Only print what would be done
    #[arg(long)]
    pub dry: bool,

    /// CMake define, repeatable
    #[arg(short = 'D', value_name = "VAR=VALUE")]
    pub defines: Vec<String>,

    /// Keep CMakeCache.txt
    #[arg(long)]
    pub no_clean_cache: bool,

    /// Build directory to use instead of build/build64
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Zip each archived install directory into this file (or directory)
    #[arg(long, value_name = "PATH")]
    pub create_zip: Option<PathBuf>,

    /// Visual Studio version
    #[arg(long, value_parser = parse_value::<VsVersion>)]
    pub vs_version: Option<VsVersion>,

    /// CMake generator toolset
    #[arg(long)]
    pub toolset: Option<String>,

    /// Print the project tree before running
    #[arg(long)]
    pub show_tree: bool,
}

#[derive(ClapArgs, Debug, Default)]
pub struct SkipArgs {
    /// Omit the build step
    #[arg(long)]
    pub skip_build: bool,
    /// Omit the install step
    #[arg(long)]
    pub skip_install: bool,
    /// Omit running the generated install rule
    #[arg(long)]
    pub skip_msbuild_install: bool,
    /// Omit merging child install directories
    #[arg(long)]
    pub skip_merge: bool,
    /// Omit driver catalog creation
    #[arg(long)]
    pub skip_catalog: bool,
    /// Omit driver cabinet creation
    #[arg(long)]
    pub skip_cabinet: bool,
    /// Omit the installer
    #[arg(long)]
    pub skip_msi: bool,
    /// Omit signing
    #[arg(long)]
    pub skip_sign: bool,
    /// Omit deployment
    #[arg(long)]
    pub skip_deploy: bool,
    /// Omit build directory cleanup
    #[arg(long)]
    pub skip_clean: bool,
    /// Build without configuring when possible
    #[arg(long)]
    pub skip_cmake: bool,
}

impl From<&SkipArgs> for SkipFlags {
    fn from(args: &SkipArgs) -> Self {
        SkipFlags {
            build: args.skip_build,
            install: args.skip_install,
            msbuild_install: args.skip_msbuild_install,
            merge: args.skip_merge,
            catalog: args.skip_catalog,
            cabinet: args.skip_cabinet,
            msi: args.skip_msi,
            sign: args.skip_sign,
            deploy: args.skip_deploy,
            clean: args.skip_clean,
            cmake: args.skip_cmake,
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct TreeArgs {
    /// Package whose tree is printed
    #[arg(short, long = "package", value_name = "PATH")]
    pub package_path: PathBuf,

    /// Architecture used to pick project_list_<arch> entries
    #[arg(short, long, default_value = "x64", value_parser = parse_value::<Arch>)]
    pub arch: Arch,
}

#[derive(ClapArgs, Debug)]
pub struct CMakeArgs {
    /// Source directory (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Architecture(s) to build for
    #[arg(long = "arch", default_value = "x64", value_parser = parse_value::<Arch>)]
    pub archs: Vec<Arch>,

    /// Build type(s)
    #[arg(long = "build-type", alias = "build_type", default_value = "Debug", value_parser = parse_value::<BuildType>)]
    pub build_types: Vec<BuildType>,

    /// Visual Studio version
    #[arg(long, alias = "vs_version", value_parser = parse_value::<VsVersion>)]
    pub vs_version: Option<VsVersion>,

    /// NMake Makefiles JOM
    #[arg(long, conflicts_with_all = ["ninja", "xcode"])]
    pub jom: bool,

    /// Ninja
    #[arg(long, conflicts_with = "xcode")]
    pub ninja: bool,

    /// Xcode project (macOS)
    #[arg(long)]
    pub xcode: bool,

    /// CMake generator toolset, the last one wins
    #[arg(long)]
    pub toolset: Vec<String>,

    /// Open the generated solution or project
    #[arg(short, long)]
    pub start_solution: bool,

    /// Build after configuring
    #[arg(short, long)]
    pub make: bool,

    /// Build without configuring first when possible
    #[arg(long)]
    pub make_fast: bool,

    /// Build target, repeatable
    #[arg(short, long = "target")]
    pub targets: Vec<String>,

    /// Build directory to use instead of build/build64
    #[arg(long, value_name = "DIR")]
    pub builddir: Option<PathBuf>,

    /// Keep CMakeCache.txt
    #[arg(long)]
    pub no_clean_cache: bool,

    /// Do not regenerate project files when CMakeLists.txt changes
    #[arg(long)]
    pub no_regen: bool,

    /// Write a dependency graph
    #[arg(long)]
    pub graph: bool,

    /// Only print the commands
    #[arg(long, alias = "dry")]
    pub dryrun: bool,

    /// CMake define, repeatable
    #[arg(short = 'D', value_name = "VAR=VALUE")]
    pub defines: Vec<String>,

    /// Additional CMake arguments (after `--`)
    #[arg(last = true)]
    pub cmake_args: Vec<String>,
}

#[derive(ClapArgs, Debug)]
pub struct DeployQtArgs {
    /// Directory the runtime is copied to
    #[arg(long, value_name = "DIR")]
    pub destination: PathBuf,

    /// Architecture of the build
    #[arg(long, default_value = "x64", value_parser = parse_value::<Arch>)]
    pub arch: Arch,

    /// Debug or Release
    #[arg(long, alias = "build_type", default_value = "Release", value_parser = parse_value::<BuildType>)]
    pub build_type: BuildType,

    /// Directory holding the Qt builds
    #[arg(long, value_name = "DIR")]
    pub qt_directory: Option<PathBuf>,

    /// Special build variant (e.g. angle)
    #[arg(long, alias = "special_build")]
    pub special_build: Option<String>,

    /// Qt version
    #[arg(long, alias = "qt_version", default_value = "5.12.6", value_parser = parse_value::<QtRelease>)]
    pub qt_version: QtRelease,

    /// Module to deploy, repeatable (default: all supported)
    #[arg(long = "qt-module", alias = "qt_module")]
    pub modules: Vec<String>,

    /// Add every module of a preset (gui, full)
    #[arg(long, value_parser = ["gui", "full"])]
    pub preset: Option<String>,

    /// Only list what would be copied
    #[arg(long)]
    pub dry: bool,
}

#[derive(ClapArgs, Debug)]
pub struct MsiArgs {
    /// Installer file to create
    pub installer_file: String,

    /// Architecture
    #[arg(short, long, default_value = "x64", value_parser = parse_value::<Arch>)]
    pub arch: Arch,

    /// Revision
    #[arg(long, default_value = "1234.5")]
    pub rev: String,

    /// C++ runtime merge module version
    #[arg(long, alias = "runtime_version", default_value = "vs2013")]
    pub runtime_version: String,

    /// Create a burn bundle (no harvesting)
    #[arg(long)]
    pub bundle: bool,

    /// Only remove intermediate files
    #[arg(long)]
    pub clean: bool,

    /// Directory holding the WiX sources (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Only print the commands
    #[arg(long)]
    pub dry: bool,
}

#[derive(ClapArgs, Debug)]
pub struct SignArgs {
    /// Files to sign
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Sign executables as burn bundles
    #[arg(long)]
    pub bundle: bool,

    /// Signature kind (Auto, app, driver, driver10, msi)
    #[arg(long = "type", default_value = "Auto", value_parser = parse_value::<SignKind>)]
    pub kind: SignKind,

    /// Only print the commands
    #[arg(long)]
    pub dry: bool,
}

#[derive(ClapArgs, Debug)]
pub struct VersionizeArgs {
    /// File to rename
    #[arg(short, long)]
    pub file: PathBuf,

    /// Header defining VERSION_MAJOR/MINOR/MICRO
    #[arg(long, alias = "version_header")]
    pub version_header: PathBuf,

    /// Revision
    #[arg(short, long)]
    pub revision: String,
}

#[derive(ClapArgs, Debug)]
pub struct VersionWxiArgs {
    /// Header defining VERSION_MAJOR/MINOR/MICRO
    pub header: PathBuf,

    /// Revision
    #[arg(default_value = "0")]
    pub revision: String,
}

fn parse_value<T>(s: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    s.parse().map_err(|e: T::Err| e.to_string())
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::Build(build) if build.package_path.as_os_str().is_empty() => {
                Err("Package path cannot be empty".to_string())
            }
            Command::Cmake(cmake) if cmake.xcode && !cfg!(target_os = "macos") => {
                Err("--xcode is only available on macOS".to_string())
            }
            Command::Cmake(cmake) if cmake.jom && !cfg!(windows) => {
                Err("--jom is only available on Windows".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, false),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}
