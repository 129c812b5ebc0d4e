//! Build configuration types and Visual Studio versions.

use std::{fmt, str::FromStr};

/// CMake build type.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default)]
pub enum BuildType {
    /// Unoptimized with debug info
    Debug,
    /// Optimized
    #[default]
    Release,
    /// Optimized with debug info
    RelWithDebInfo,
    /// Instrumented coverage build
    Coverage,
}

impl BuildType {
    /// Name passed to `CMAKE_BUILD_TYPE` and MSBuild `Configuration`.
    pub fn as_str(self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::Coverage => "coverage",
        }
    }

    /// Whether runtime libraries should be the debug variants.
    pub fn is_debug(self) -> bool {
        matches!(self, BuildType::Debug)
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = crate::bundler::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Debug" => Ok(BuildType::Debug),
            "Release" => Ok(BuildType::Release),
            "RelWithDebInfo" => Ok(BuildType::RelWithDebInfo),
            "coverage" => Ok(BuildType::Coverage),
            other => Err(crate::bundler::Error::GenericError(format!(
                "unknown build type `{other}` (expected Debug, Release, RelWithDebInfo or coverage)"
            ))),
        }
    }
}

/// Visual Studio release, identified on the command line by its year.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct VsVersion(u32);

impl VsVersion {
    /// Visual Studio 2017.
    pub const VS2017: VsVersion = VsVersion(15);
    /// Visual Studio 2019, the default generator.
    pub const VS2019: VsVersion = VsVersion(16);

    const YEARS: [(&'static str, u32); 8] = [
        ("2008", 9),
        ("2010", 10),
        ("2012", 11),
        ("2013", 12),
        ("2015", 14),
        ("2017", 15),
        ("2019", 16),
        ("2022", 17),
    ];

    /// Internal major version (`16` for 2019).
    pub fn major(self) -> u32 {
        self.0
    }

    /// Product year (`"2019"`).
    pub fn year(self) -> &'static str {
        Self::YEARS
            .iter()
            .find(|(_, major)| *major == self.0)
            .map(|(year, _)| *year)
            .unwrap_or("2019")
    }

    /// Years accepted on the command line.
    pub fn known_years() -> impl Iterator<Item = &'static str> {
        Self::YEARS.iter().map(|(year, _)| *year)
    }
}

impl Default for VsVersion {
    fn default() -> Self {
        VsVersion::VS2019
    }
}

impl fmt::Display for VsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.year())
    }
}

impl FromStr for VsVersion {
    type Err = crate::bundler::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::YEARS
            .iter()
            .find(|(year, _)| *year == s)
            .map(|(_, major)| VsVersion(*major))
            .ok_or_else(|| {
                crate::bundler::Error::GenericError(format!(
                    "unknown Visual Studio version `{s}` (expected one of {})",
                    Self::known_years().collect::<Vec<_>>().join(", ")
                ))
            })
    }
}
