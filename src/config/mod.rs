//! Tool configuration from `packtree.toml`
//!
//! ```toml
//! [tools]
//! msbuild = 'C:\Program Files\Microsoft Visual Studio\2019\Professional\MSBuild\Current\Bin\MSBuild.exe'
//! sign_command = 'D:\signature\sign.cmd'
//!
//! [paths]
//! project_tree = "packaging/project_tree.json"
//! qt_dir = "opt/qt"
//! ```
//!
//! Relative `[paths]` entries are resolved against the workspace.

use crate::bundler::ToolSettings;
use crate::error::{CliError, PacktreeError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up in the workspace root.
pub const CONFIG_FILE: &str = "packtree.toml";

/// External tool locations
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolPaths {
    pub cmake: Option<PathBuf>,
    pub msbuild: Option<PathBuf>,
    pub inf2cat: Option<PathBuf>,
    pub signtool: Option<PathBuf>,
    pub makecab: Option<PathBuf>,
    /// WiX installation root, `bin/` is appended
    pub wix_root: Option<PathBuf>,
    pub sign_command: Option<PathBuf>,
}

/// Workspace data locations
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataPaths {
    pub project_tree: Option<PathBuf>,
    pub qt_dir: Option<PathBuf>,
    pub runtime_msm_dir: Option<PathBuf>,
    pub wix_includes_dir: Option<PathBuf>,
    pub pi_toolchain: Option<PathBuf>,
}

/// Parsed `packtree.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub tools: ToolPaths,
    pub paths: DataPaths,
}

impl ToolConfig {
    /// Parses a configuration file (single read + parse).
    pub fn load_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PacktreeError::Cli(CliError::InvalidConfig {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        })?;

        toml::from_str(&text).map_err(|e| {
            PacktreeError::Cli(CliError::InvalidConfig {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        })
    }

    /// Loads the configuration for `workspace`.
    ///
    /// An explicit file must exist. Otherwise `<workspace>/packtree.toml`
    /// is used, then `<config dir>/packtree/config.toml`; with neither
    /// present every tool is looked up at run time.
    pub fn discover(workspace: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }

        for candidate in Self::candidates(workspace) {
            if candidate.is_file() {
                log::debug!("Using tool configuration {}", candidate.display());
                return Self::load_file(&candidate);
            }
        }

        log::debug!("No tool configuration found");
        Ok(Self::default())
    }

    fn candidates(workspace: &Path) -> Vec<PathBuf> {
        let mut candidates = vec![workspace.join(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("packtree").join("config.toml"));
        }
        candidates
    }

    /// Tool settings with relative data paths resolved against `workspace`.
    pub fn into_tool_settings(self, workspace: &Path) -> ToolSettings {
        let resolve = |p: Option<PathBuf>| p.map(|p| workspace.join(p));

        ToolSettings {
            cmake: self.tools.cmake,
            msbuild: self.tools.msbuild,
            inf2cat: self.tools.inf2cat,
            signtool: self.tools.signtool,
            makecab: self.tools.makecab,
            wix_root: self.tools.wix_root,
            sign_command: self.tools.sign_command,
            project_tree: resolve(self.paths.project_tree),
            qt_dir: resolve(self.paths.qt_dir),
            runtime_msm_dir: resolve(self.paths.runtime_msm_dir),
            wix_includes_dir: resolve(self.paths.wix_includes_dir),
            pi_toolchain: resolve(self.paths.pi_toolchain),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_paths_are_workspace_relative() {
        let config: ToolConfig = toml::from_str(
            r#"
            [tools]
            sign_command = "/opt/sign/sign.sh"

            [paths]
            project_tree = "packaging/tree.json"
            qt_dir = "/opt/qt"
            "#,
        )
        .unwrap();

        let tools = config.into_tool_settings(Path::new("/ws"));
        assert_eq!(tools.sign_command.as_deref(), Some(Path::new("/opt/sign/sign.sh")));
        assert_eq!(tools.project_tree.as_deref(), Some(Path::new("/ws/packaging/tree.json")));
        assert_eq!(tools.qt_dir.as_deref(), Some(Path::new("/opt/qt")));
        assert!(tools.msbuild.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[tools]\nmsbiuld = \"x\"\n").unwrap();

        let err = ToolConfig::load_file(&path).unwrap_err();
        assert!(matches!(err, PacktreeError::Cli(CliError::InvalidConfig { .. })));
    }

    #[test]
    fn workspace_file_is_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[tools]\ncmake = \"/usr/bin/cmake3\"\n")
            .unwrap();

        let config = ToolConfig::discover(dir.path(), None).unwrap();
        assert_eq!(config.tools.cmake.as_deref(), Some(Path::new("/usr/bin/cmake3")));
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ToolConfig::discover(dir.path(), Some(&dir.path().join("nope.toml"))).is_err());
    }
}
