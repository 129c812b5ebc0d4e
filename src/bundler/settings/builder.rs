//! Builder for constructing Settings.

use super::{Arch, BuildType, Settings, SkipFlags, ToolSettings, VsVersion};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Builder for constructing [`Settings`].
///
/// # Examples
///
/// ```no_run
/// use packtree::bundler::{Arch, BuildType, SettingsBuilder, VsVersion};
///
/// # fn example() -> packtree::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .workspace("/src/product")
///     .package_path("suite")
///     .arch(Arch::X86)
///     .build_type(BuildType::RelWithDebInfo)
///     .vs_version(VsVersion::VS2017)
///     .build()?;
///
/// // 2017 without a toolset builds with 2019 and v141
/// assert_eq!(settings.vs_version(), Some(VsVersion::VS2019));
/// assert_eq!(settings.toolset(), Some("v141"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SettingsBuilder {
    workspace: Option<PathBuf>,
    package_path: Option<PathBuf>,
    package_base_dir: Option<PathBuf>,
    setup_name: Option<String>,
    arch: Arch,
    build_type: BuildType,
    revision: String,
    defines: Vec<String>,
    install_prefix: PathBuf,
    build_dir: Option<PathBuf>,
    deployment_dir: Option<PathBuf>,
    create_zip: Option<PathBuf>,
    skip: SkipFlags,
    sign: bool,
    vs_version: Option<VsVersion>,
    toolset: Option<String>,
    clean_cache: bool,
    dry_run: bool,
    tools: ToolSettings,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self {
            workspace: None,
            package_path: None,
            package_base_dir: None,
            setup_name: None,
            arch: Arch::X64,
            build_type: BuildType::Release,
            revision: "1234".into(),
            defines: Vec::new(),
            install_prefix: PathBuf::from("tmp/build_dir"),
            build_dir: None,
            deployment_dir: None,
            create_zip: None,
            skip: SkipFlags::default(),
            sign: false,
            vs_version: None,
            toolset: None,
            clean_cache: true,
            dry_run: false,
            tools: ToolSettings::default(),
        }
    }
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the repository root.
    ///
    /// # Required
    pub fn workspace<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.workspace = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the package to build.
    ///
    /// # Required
    pub fn package_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.package_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the packaging configuration base dir.
    ///
    /// Default: `<workspace>/packaging/Win`
    pub fn package_base_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.package_base_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Overrides the installer file name.
    pub fn setup_name(mut self, name: Option<String>) -> Self {
        self.setup_name = name;
        self
    }

    /// Default: `x64`
    pub fn arch(mut self, arch: Arch) -> Self {
        self.arch = arch;
        self
    }

    /// Default: `Release`
    pub fn build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = build_type;
        self
    }

    /// Default: `1234`
    pub fn revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    /// CMake `-D` defines without the `-D` prefix.
    pub fn defines(mut self, defines: Vec<String>) -> Self {
        self.defines = defines;
        self
    }

    /// Install prefix, made absolute against the current directory.
    ///
    /// Default: `tmp/build_dir`
    pub fn install_prefix<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.install_prefix = path.as_ref().to_path_buf();
        self
    }

    /// Overrides the per-arch build directory.
    pub fn build_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.build_dir = dir;
        self
    }

    /// Default: `<cwd>/PKGS`
    pub fn deployment_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.deployment_dir = dir;
        self
    }

    /// Zip every packaged install dir into this archive.
    pub fn create_zip(mut self, archive: Option<PathBuf>) -> Self {
        self.create_zip = archive;
        self
    }

    /// Run-wide skip switches.
    pub fn skip(mut self, skip: SkipFlags) -> Self {
        self.skip = skip;
        self
    }

    /// Force signing even in dry runs.
    pub fn sign(mut self, sign: bool) -> Self {
        self.sign = sign;
        self
    }

    /// Visual Studio version.
    pub fn vs_version(mut self, version: VsVersion) -> Self {
        self.vs_version = Some(version);
        self
    }

    /// CMake generator toolset.
    pub fn toolset(mut self, toolset: Option<String>) -> Self {
        self.toolset = toolset;
        self
    }

    /// Default: `true`
    pub fn clean_cache(mut self, clean: bool) -> Self {
        self.clean_cache = clean;
        self
    }

    /// Skip build, install, msi, sign, deploy, clean and configure.
    pub fn dry_run(mut self, dry: bool) -> Self {
        self.dry_run = dry;
        self
    }

    /// Tool overrides.
    pub fn tools(mut self, tools: ToolSettings) -> Self {
        self.tools = tools;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `workspace` or `package_path` is missing, or the
    /// package path has no file name.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        use crate::bundler::error::{Context, ErrorExt};

        let workspace = self.workspace.context("workspace is required")?;
        let package_path = self.package_path.context("package_path is required")?;
        let package_name = package_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("package path {} has no name", package_path.display()))?;

        let install_prefix = self
            .install_prefix
            .absolutize()
            .fs_context("resolving install prefix", &self.install_prefix)?
            .into_owned();

        let deployment_dir = match self.deployment_dir {
            Some(dir) => workspace.join(dir),
            None => std::env::current_dir()
                .fs_context("reading current directory", ".")?
                .join("PKGS"),
        };

        let create_zip = match self.create_zip {
            Some(archive) => Some(
                archive
                    .absolutize()
                    .fs_context("resolving archive path", &archive)?
                    .into_owned(),
            ),
            None => None,
        };

        let mut skip = self.skip;
        if self.dry_run {
            skip = skip.dry();
        }
        if self.sign {
            skip.sign = false;
        }

        let mut vs_version = self.vs_version;
        let mut toolset = self.toolset;
        if vs_version == Some(VsVersion::VS2017) && toolset.is_none() {
            vs_version = Some(VsVersion::VS2019);
            toolset = Some("v141".into());
        }

        let package_base_dir = self
            .package_base_dir
            .unwrap_or_else(|| workspace.join("packaging").join("Win"));

        Ok(Settings {
            workspace,
            package_path,
            package_name,
            package_base_dir,
            setup_name: self.setup_name,
            arch: self.arch,
            build_type: self.build_type,
            revision: self.revision,
            defines: self.defines,
            install_prefix,
            build_dir: self.build_dir,
            deployment_dir,
            create_zip,
            skip,
            vs_version,
            toolset,
            clean_cache: self.clean_cache,
            dry_run: self.dry_run,
            tools: self.tools,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SettingsBuilder {
        SettingsBuilder::new()
            .workspace("/ws")
            .package_path("packaging/suite")
            .install_prefix("/out/install")
    }

    #[test]
    fn package_name_is_basename() {
        let settings = base().build().unwrap();
        assert_eq!(settings.package_name(), "suite");
        assert_eq!(settings.package_base_dir(), Path::new("/ws/packaging/Win"));
        assert_eq!(
            settings.ignore_marker(),
            Path::new("/ws/packaging/Win/packaging/suite/dwignore")
        );
    }

    #[test]
    fn dry_run_skips_heavy_steps_but_forced_signing() {
        let settings = base().dry_run(true).build().unwrap();
        assert_eq!(*settings.skip(), SkipFlags::default().dry());
        assert!(!settings.skip().merge);
        assert!(!settings.skip().catalog);

        let settings = base().dry_run(true).sign(true).build().unwrap();
        assert!(!settings.skip().sign);
        assert!(settings.skip().build);
        assert!(settings.skip().msi);
    }

    #[test]
    fn vs2017_without_toolset_becomes_2019_v141() {
        let settings = base().vs_version(VsVersion::VS2017).build().unwrap();
        assert_eq!(settings.vs_version(), Some(VsVersion::VS2019));
        assert_eq!(settings.toolset(), Some("v141"));

        let settings = base()
            .vs_version(VsVersion::VS2017)
            .toolset(Some("v140".into()))
            .build()
            .unwrap();
        assert_eq!(settings.vs_version(), Some(VsVersion::VS2017));
        assert_eq!(settings.toolset(), Some("v140"));
    }

    #[test]
    fn skip_cmake_means_make_fast_without_cache_cleaning() {
        let settings = base()
            .skip(SkipFlags {
                cmake: true,
                ..Default::default()
            })
            .build()
            .unwrap();
        assert!(settings.make_fast());
        assert!(!settings.clean_cache());
    }

    #[test]
    fn install_dir_prefers_node_setting() {
        let settings = base().build().unwrap();
        assert_eq!(
            settings.install_dir_for("core", None),
            Path::new("/out/install/core")
        );
        assert_eq!(
            settings.install_dir_for("core", Some(Path::new("shared"))),
            Path::new("/out/install/shared")
        );
    }

    #[test]
    fn missing_package_is_an_error() {
        assert!(SettingsBuilder::new().workspace("/ws").build().is_err());
    }
}
