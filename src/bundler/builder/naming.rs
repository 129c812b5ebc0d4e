//! Product version headers and the file names derived from them.
//!
//! Version headers are C headers defining `VERSION_MAJOR`, `VERSION_MINOR`
//! and `VERSION_MICRO`. Missing components default to `1.0.0`.

use crate::bundler::{Arch, Result, error::ErrorExt};
use regex::Regex;
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::LazyLock,
};

static VERSION_DEFINE: LazyLock<std::result::Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*#define\s+VERSION_(MAJOR|MINOR|MICRO)\s+(\S+)")
});

/// Product version from a version header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductVersion {
    /// `VERSION_MAJOR`
    pub major: String,
    /// `VERSION_MINOR`
    pub minor: String,
    /// `VERSION_MICRO`
    pub micro: String,
}

impl Default for ProductVersion {
    fn default() -> Self {
        Self {
            major: "1".into(),
            minor: "0".into(),
            micro: "0".into(),
        }
    }
}

impl ProductVersion {
    /// Parses the `#define`s of a version header.
    pub fn parse_header(text: &str) -> Self {
        let mut version = Self::default();
        let Ok(re) = VERSION_DEFINE.as_ref() else {
            return version;
        };
        for caps in re.captures_iter(text) {
            let value = caps[2].to_string();
            match &caps[1] {
                "MAJOR" => version.major = value,
                "MINOR" => version.minor = value,
                _ => version.micro = value,
            }
        }
        version
    }

    /// Reads and parses a version header.
    pub async fn read_header(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .fs_context("reading version header", path)?;
        Ok(Self::parse_header(&text))
    }

    /// `major.minor.micro.revision`
    pub fn with_revision(&self, revision: &str) -> String {
        format!("{self}.{revision}")
    }
}

impl fmt::Display for ProductVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

/// Substitutes `%ARCH%` and, when known, `%VERSION%` in a setup name.
pub fn expand_setup_name(template: &str, arch: Arch, version: Option<&str>) -> String {
    let name = template.replace("%ARCH%", arch.as_str());
    match version {
        Some(version) => name.replace("%VERSION%", version),
        None => name,
    }
}

/// WiX include defining `PRODUCT_VERSION`.
pub fn product_version_wxi(version: &ProductVersion, revision: &str) -> String {
    format!(
        "<Include><?define PRODUCT_VERSION=\"{}\"?></Include>",
        version.with_revision(revision)
    )
}

/// `<stem>-<major>-<minor>-<micro>-<revision><ext>` next to `file`.
pub fn versionized_file_name(file: &Path, version: &ProductVersion, revision: &str) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = file
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let name = format!(
        "{stem}-{}-{}-{}-{revision}{ext}",
        version.major, version.minor, version.micro
    );
    file.with_file_name(name)
}

/// Renames `file` to its versionized name and returns the new path.
pub async fn versionize(file: &Path, header: &Path, revision: &str) -> Result<PathBuf> {
    let version = ProductVersion::read_header(header).await?;
    let target = versionized_file_name(file, &version, revision);
    tokio::fs::rename(file, &target)
        .await
        .fs_context("renaming file", file)?;
    Ok(target)
}
