//! Core Settings struct and implementations.

use super::{Arch, BuildType, SkipFlags, ToolSettings, VsVersion};
use std::path::{Path, PathBuf};

/// Settings of one packaging run.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder), which applies
/// the run-level rules (dry runs, Visual Studio 2017 remapping, absolute
/// install prefix).
///
/// # Examples
///
/// ```no_run
/// use packtree::bundler::{Arch, SettingsBuilder};
///
/// # fn example() -> packtree::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .workspace("/src/product")
///     .package_path("apps/viewer")
///     .arch(Arch::X64)
///     .build()?;
/// assert_eq!(settings.package_name(), "viewer");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    pub(super) workspace: PathBuf,
    pub(super) package_path: PathBuf,
    pub(super) package_name: String,
    pub(super) package_base_dir: PathBuf,
    pub(super) setup_name: Option<String>,
    pub(super) arch: Arch,
    pub(super) build_type: BuildType,
    pub(super) revision: String,
    pub(super) defines: Vec<String>,
    pub(super) install_prefix: PathBuf,
    pub(super) build_dir: Option<PathBuf>,
    pub(super) deployment_dir: PathBuf,
    pub(super) create_zip: Option<PathBuf>,
    pub(super) skip: SkipFlags,
    pub(super) vs_version: Option<VsVersion>,
    pub(super) toolset: Option<String>,
    pub(super) clean_cache: bool,
    pub(super) dry_run: bool,
    pub(super) tools: ToolSettings,
}

impl Settings {
    /// Repository root.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Package path as given on the command line.
    pub fn package_path(&self) -> &Path {
        &self.package_path
    }

    /// Basename of the package path, the root project of the run.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Base directory of the packaging configuration (`packaging/Win`).
    pub fn package_base_dir(&self) -> &Path {
        &self.package_base_dir
    }

    /// Installer file name override.
    pub fn setup_name(&self) -> Option<&str> {
        self.setup_name.as_deref()
    }

    /// Architecture of the run.
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Build type.
    pub fn build_type(&self) -> BuildType {
        self.build_type
    }

    /// Revision used for versions and installer names.
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// `-D` defines forwarded to CMake.
    pub fn defines(&self) -> &[String] {
        &self.defines
    }

    /// Absolute install prefix.
    pub fn install_prefix(&self) -> &Path {
        &self.install_prefix
    }

    /// Build directory override.
    pub fn build_dir(&self) -> Option<&Path> {
        self.build_dir.as_deref()
    }

    /// Where installers are copied to.
    pub fn deployment_dir(&self) -> &Path {
        &self.deployment_dir
    }

    /// Archive to create from install dirs.
    pub fn create_zip(&self) -> Option<&Path> {
        self.create_zip.as_deref()
    }

    /// Run-wide skip switches.
    pub fn skip(&self) -> &SkipFlags {
        &self.skip
    }

    /// Visual Studio version for generators and runtimes.
    pub fn vs_version(&self) -> Option<VsVersion> {
        self.vs_version
    }

    /// CMake generator toolset.
    pub fn toolset(&self) -> Option<&str> {
        self.toolset.as_deref()
    }

    /// Whether `CMakeCache.txt` is removed before configuring.
    pub fn clean_cache(&self) -> bool {
        self.clean_cache && !self.skip.cmake
    }

    /// Build without configuring first when possible.
    pub fn make_fast(&self) -> bool {
        self.skip.cmake
    }

    /// Whether the run was started as a dry run.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Tool overrides.
    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }

    /// Install directory of a project: `<install_prefix>/<install_dir or name>`.
    pub fn install_dir_for(&self, name: &str, install_dir: Option<&Path>) -> PathBuf {
        match install_dir {
            Some(dir) => self.install_prefix.join(dir),
            None => self.install_prefix.join(name),
        }
    }

    /// Marker whose presence turns the run into a no-op.
    pub fn ignore_marker(&self) -> PathBuf {
        self.package_base_dir.join(&self.package_path).join("dwignore")
    }
}
