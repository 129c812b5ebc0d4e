//! Workspace resolution

use crate::config::CONFIG_FILE;
use crate::error::{CliError, PacktreeError, Result};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Where the workspace root comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceSource {
    /// Given with `--workspace`
    Explicit(PathBuf),
    /// Searched upwards from a directory
    Discover(PathBuf),
}

impl WorkspaceSource {
    pub fn new(explicit: Option<PathBuf>) -> Result<Self> {
        match explicit {
            Some(path) => Ok(Self::Explicit(path)),
            None => Ok(Self::Discover(std::env::current_dir()?)),
        }
    }

    /// Absolute workspace root.
    ///
    /// Discovery picks the nearest ancestor holding `packtree.toml` or a
    /// `packaging/` directory and falls back to the start directory.
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            Self::Explicit(path) => {
                let path = absolute(path)?;
                if !path.is_dir() {
                    return Err(PacktreeError::Cli(CliError::InvalidArguments {
                        reason: format!("Workspace does not exist: {}", path.display()),
                    }));
                }
                Ok(path)
            }
            Self::Discover(start) => {
                let start = absolute(start)?;
                let found = start
                    .ancestors()
                    .find(|dir| is_workspace_root(dir))
                    .map(Path::to_path_buf);
                match found {
                    Some(root) => {
                        log::debug!("Workspace found at {}", root.display());
                        Ok(root)
                    }
                    None => Ok(start),
                }
            }
        }
    }
}

fn is_workspace_root(dir: &Path) -> bool {
    dir.join(CONFIG_FILE).is_file() || dir.join("packaging").is_dir()
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(path.absolutize()?.into_owned())
}
