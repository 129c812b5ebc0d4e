//! External tool detection.
//!
//! Each Windows build tool is resolved in the same order: the configured
//! path, then `PATH`, then the install locations of the Visual Studio and
//! Windows Kit releases in use on the build machines. `PATH` lookups are
//! cached for the lifetime of the process.

use crate::bundler::error::{Error, Result};
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

const MSBUILD_CANDIDATES: &[&str] = &[
    "C:/Program Files (x86)/Microsoft Visual Studio/2019/Professional/MSBuild/Current/Bin/amd64/MSBuild.exe",
    "C:/Program Files (x86)/Microsoft Visual Studio/2019/Professional/MSBuild/Current/Bin/MSBuild.exe",
    "C:/Program Files (x86)/Microsoft Visual Studio/2017/Professional/MSBuild/15.0/Bin/amd64/MSBuild.exe",
    "C:/Program Files (x86)/Microsoft Visual Studio/2017/Professional/MSBuild/15.0/Bin/MSBuild.exe",
    "C:/Program Files (x86)/Microsoft Visual Studio/2019/Community/MSBuild/Current/Bin/amd64/MSBuild.exe",
    "C:/Program Files (x86)/Microsoft Visual Studio/2019/Community/MSBuild/Current/Bin/MSBuild.exe",
    "C:/Program Files (x86)/Microsoft Visual Studio/2017/Community/MSBuild/15.0/Bin/amd64/MSBuild.exe",
    "C:/Program Files (x86)/Microsoft Visual Studio/2017/Community/MSBuild/15.0/Bin/MSBuild.exe",
    "C:/Program Files (x86)/MSBuild/12.0/Bin/amd64/MSBuild.exe",
    "C:/Program Files (x86)/MSBuild/12.0/Bin/MSBuild.exe",
];

const INF2CAT_CANDIDATES: &[&str] = &["C:/Program Files (x86)/Windows Kits/10/bin/x86/Inf2Cat.exe"];

const SIGNTOOL_CANDIDATES: &[&str] = &[
    "C:/Program Files (x86)/Windows Kits/10/App Certification Kit/signtool.exe",
    "C:/Program Files (x86)/Windows Kits/10/bin/10.0.17763.0/x64/signtool.exe",
    "C:/Program Files (x86)/Windows Kits/10/bin/10.0.17763.0/x86/signtool.exe",
    "C:/Program Files (x86)/Windows Kits/10/bin/10.0.18362.0/x64/signtool.exe",
    "C:/Program Files (x86)/Windows Kits/10/bin/10.0.18362.0/x86/signtool.exe",
    "C:/Program Files (x86)/Windows Kits/8.1/bin/x64/signtool.exe",
    "C:/Program Files (x86)/Windows Kits/8.1/bin/x86/signtool.exe",
    "C:/Program Files (x86)/Microsoft SDKs/Windows/v7.1A/Bin/signtool.exe",
];

static MSBUILD_ON_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| on_path("MSBuild"));
static INF2CAT_ON_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| on_path("Inf2Cat"));
static SIGNTOOL_ON_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| on_path("signtool"));
static MAKECAB_ON_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| on_path("MakeCab"));

fn on_path(name: &str) -> Option<PathBuf> {
    match which::which(name) {
        Ok(path) => {
            log::debug!("Found {} at: {}", name, path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{name} not found in PATH: {e}");
            None
        }
    }
}

fn resolve(
    configured: Option<&Path>,
    path_hit: &LazyLock<Option<PathBuf>>,
    candidates: &[&str],
) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        log::warn!("Configured tool {} does not exist, searching", path.display());
    }
    if let Some(path) = path_hit.as_ref() {
        return Some(path.clone());
    }
    candidates
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}

/// Locates `MSBuild.exe`.
pub fn find_msbuild(configured: Option<&Path>) -> Result<PathBuf> {
    resolve(configured, &MSBUILD_ON_PATH, MSBUILD_CANDIDATES).ok_or_else(|| Error::ToolNotFound {
        tool: "MSBuild",
        hint: "install Visual Studio build tools or set tools.msbuild in packtree.toml".into(),
    })
}

/// Locates `Inf2Cat.exe`.
pub fn find_inf2cat(configured: Option<&Path>) -> Result<PathBuf> {
    resolve(configured, &INF2CAT_ON_PATH, INF2CAT_CANDIDATES).ok_or_else(|| Error::ToolNotFound {
        tool: "Inf2Cat",
        hint: "install the Windows Driver Kit or set tools.inf2cat in packtree.toml".into(),
    })
}

/// Locates `signtool.exe`; absence only disables verification.
pub fn find_signtool(configured: Option<&Path>) -> Option<PathBuf> {
    resolve(configured, &SIGNTOOL_ON_PATH, SIGNTOOL_CANDIDATES)
}

/// Locates `MakeCab.exe`, falling back to the bare name.
pub fn find_makecab(configured: Option<&Path>) -> PathBuf {
    resolve(configured, &MAKECAB_ON_PATH, &[]).unwrap_or_else(|| PathBuf::from("MakeCab"))
}
