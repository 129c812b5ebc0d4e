//! Run-wide skip switches.

/// Steps that can be switched off for a whole run.
///
/// Per-node `skip_*` keys in the project tree are combined with these; a step
/// runs only when neither the run nor the node skips it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SkipFlags {
    /// Configure and compile
    pub build: bool,
    /// Install rule and file copy
    pub install: bool,
    /// Only the generated install rule, file copy still happens
    pub msbuild_install: bool,
    /// Gathering child install dirs into the parent
    pub merge: bool,
    /// Driver catalog creation
    pub catalog: bool,
    /// Driver cabinet creation
    pub cabinet: bool,
    /// Installer linking
    pub msi: bool,
    /// Code signing
    pub sign: bool,
    /// Copy to the deployment directory
    pub deploy: bool,
    /// Removal of intermediate object files
    pub clean: bool,
    /// Configure step; builds reuse the existing cache
    pub cmake: bool,
}

impl SkipFlags {
    /// Every step skipped.
    pub fn all() -> Self {
        Self {
            build: true,
            install: true,
            msbuild_install: true,
            merge: true,
            catalog: true,
            cabinet: true,
            msi: true,
            sign: true,
            deploy: true,
            clean: true,
            cmake: true,
        }
    }

    /// Adds the skips of a dry run.
    ///
    /// Merge, msbuild install and the driver catalog and cabinet steps keep
    /// their current setting.
    pub fn dry(self) -> Self {
        Self {
            build: true,
            install: true,
            msi: true,
            sign: true,
            deploy: true,
            clean: true,
            cmake: true,
            ..self
        }
    }

    /// Names of the skipped steps, for verbose run summaries.
    pub fn skipped_names(&self) -> Vec<&'static str> {
        [
            (self.build, "build"),
            (self.install, "install"),
            (self.msbuild_install, "msbuild-install"),
            (self.merge, "merge"),
            (self.catalog, "catalog"),
            (self.cabinet, "cabinet"),
            (self.msi, "msi"),
            (self.sign, "sign"),
            (self.deploy, "deploy"),
            (self.clean, "clean"),
            (self.cmake, "cmake"),
        ]
        .into_iter()
        .filter_map(|(skipped, name)| skipped.then_some(name))
        .collect()
    }
}
