//! CMake version probing.

use crate::bundler::{Result, utils::ToolCommand};
use regex::Regex;
use std::{fmt, path::Path, sync::LazyLock};

static VERSION_RE: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"version\s+(\d+)\.(\d+)"));

/// Major and minor version of the installed CMake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CMakeVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
}

impl CMakeVersion {
    /// First release whose Visual Studio generators accept `host=x64`.
    pub const HOST_TOOLSET: CMakeVersion = CMakeVersion { major: 3, minor: 8 };

    /// Parses `cmake --version` output.
    pub fn parse(output: &str) -> Option<Self> {
        let re = VERSION_RE.as_ref().ok()?;
        let caps = re.captures(output)?;
        Some(Self {
            major: caps.get(1)?.as_str().parse().ok()?,
            minor: caps.get(2)?.as_str().parse().ok()?,
        })
    }

    /// Runs `cmake --version`.
    pub async fn probe(cmake: &Path) -> Result<Option<Self>> {
        let output = ToolCommand::new(cmake).arg("--version").output().await?;
        Ok(Self::parse(&output))
    }
}

impl fmt::Display for CMakeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
