//! Locations of external tools and shared packaging inputs.

use std::path::{Path, PathBuf};

/// Default signing script on the signing machines.
pub const DEFAULT_SIGN_COMMAND: &str = r"C:\signature\sign.cmd";

/// Tool and path overrides.
///
/// Every field is optional. Unset tools are looked up on `PATH` and in the
/// well known install locations, unset paths fall back to their location
/// inside the workspace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolSettings {
    /// `cmake` executable
    pub cmake: Option<PathBuf>,
    /// `MSBuild.exe`
    pub msbuild: Option<PathBuf>,
    /// `Inf2Cat.exe`
    pub inf2cat: Option<PathBuf>,
    /// `signtool.exe`, used for verification only
    pub signtool: Option<PathBuf>,
    /// `MakeCab.exe`
    pub makecab: Option<PathBuf>,
    /// WiX installation root, binaries live in `<root>/bin`
    pub wix_root: Option<PathBuf>,
    /// Signing script invoked as `<cmd> <file> <kind>`
    pub sign_command: Option<PathBuf>,
    /// Project tree JSON
    pub project_tree: Option<PathBuf>,
    /// Directory holding the Qt builds
    pub qt_dir: Option<PathBuf>,
    /// Directory holding `<runtime>_<arch>` merge module folders
    pub runtime_msm_dir: Option<PathBuf>,
    /// Shared WiX include files
    pub wix_includes_dir: Option<PathBuf>,
    /// CMake toolchain file for Raspberry Pi cross builds
    pub pi_toolchain: Option<PathBuf>,
}

impl ToolSettings {
    /// Program used to run CMake.
    pub fn cmake_program(&self) -> PathBuf {
        self.cmake.clone().unwrap_or_else(|| PathBuf::from("cmake"))
    }

    /// Signing script.
    pub fn sign_command(&self) -> PathBuf {
        self.sign_command
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SIGN_COMMAND))
    }

    /// WiX `bin` directory from the configured root or the `WIX` variable.
    pub fn wix_bin_dir(&self) -> Option<PathBuf> {
        self.wix_root
            .clone()
            .or_else(|| std::env::var_os("WIX").map(PathBuf::from))
            .map(|root| root.join("bin"))
    }

    /// Project tree location for a workspace.
    pub fn project_tree_path(&self, workspace: &Path) -> PathBuf {
        self.project_tree
            .clone()
            .unwrap_or_else(|| workspace.join("packaging").join("project_tree.json"))
    }

    /// Merge module root for a workspace.
    pub fn runtime_msm_dir(&self, workspace: &Path) -> PathBuf {
        self.runtime_msm_dir.clone().unwrap_or_else(|| {
            workspace
                .join("packaging")
                .join("Win")
                .join("bin")
                .join("CPPRuntime")
        })
    }

    /// Shared WiX includes for a workspace.
    pub fn wix_includes_dir(&self, workspace: &Path) -> PathBuf {
        self.wix_includes_dir
            .clone()
            .unwrap_or_else(|| workspace.join("packaging").join("Win").join("WiX"))
    }

    /// Raspberry Pi toolchain file for a workspace.
    pub fn pi_toolchain(&self, workspace: &Path) -> PathBuf {
        self.pi_toolchain.clone().unwrap_or_else(|| {
            workspace
                .join("build_util")
                .join("cmake")
                .join("Toolchain-arm-raspberry.cmake")
        })
    }

    /// Qt builds directory: `opt/qt`, or `3rdparty/qt` when that is missing.
    pub fn qt_dir(&self, workspace: &Path) -> PathBuf {
        if let Some(dir) = &self.qt_dir {
            return dir.clone();
        }
        let opt = workspace.join("opt").join("qt");
        if opt.exists() {
            opt
        } else {
            workspace.join("3rdparty").join("qt")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_defaults() {
        let tools = ToolSettings::default();
        let ws = Path::new("/ws");
        assert_eq!(
            tools.project_tree_path(ws),
            Path::new("/ws/packaging/project_tree.json")
        );
        assert_eq!(
            tools.runtime_msm_dir(ws),
            Path::new("/ws/packaging/Win/bin/CPPRuntime")
        );
        assert_eq!(tools.cmake_program(), PathBuf::from("cmake"));
        assert_eq!(tools.sign_command(), PathBuf::from(DEFAULT_SIGN_COMMAND));
    }

    #[test]
    fn qt_dir_falls_back_to_3rdparty() {
        let ws = tempfile::tempdir().unwrap();
        let tools = ToolSettings::default();
        assert_eq!(tools.qt_dir(ws.path()), ws.path().join("3rdparty/qt"));
        std::fs::create_dir_all(ws.path().join("opt/qt")).unwrap();
        assert_eq!(tools.qt_dir(ws.path()), ws.path().join("opt/qt"));
    }
}
