//! CPU architecture types and utilities.

use std::{fmt, str::FromStr};

/// Target architecture of a native build.
///
/// Parsed from and printed as the short lowercase names used on the command
/// line and in the project tree (`x86`, `x64`, ...).
///
/// # Examples
///
/// ```
/// use packtree::bundler::Arch;
///
/// let arch: Arch = "x64".parse().unwrap();
/// assert_eq!(arch.build_dir_name(), "build64");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 32-bit Intel
    X86,
    /// 64-bit Intel/AMD
    X64,
    /// 32-bit Intel build variant with its own build directory
    X38,
    /// Raspberry Pi, cross compiled with the ARM toolchain file
    Pi,
    /// ARM hard-float
    Armhf,
}

impl Arch {
    /// All architectures in command line order.
    pub const ALL: [Arch; 5] = [Arch::X86, Arch::X64, Arch::X38, Arch::Pi, Arch::Armhf];

    /// Short name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X64 => "x64",
            Arch::X38 => "x38",
            Arch::Pi => "pi",
            Arch::Armhf => "armhf",
        }
    }

    /// Default build directory name for this architecture.
    ///
    /// `x86` builds in `build`, `x64` in `build64`, everything else in
    /// `build<arch>`.
    pub fn build_dir_name(self) -> String {
        match self {
            Arch::X86 => "build".to_string(),
            Arch::X64 => "build64".to_string(),
            other => format!("build{}", other.as_str()),
        }
    }

    /// MSBuild `Platform` property for CMake generated projects.
    pub fn msbuild_platform(self) -> &'static str {
        match self {
            Arch::X86 => "Win32",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = crate::bundler::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Arch::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| {
                crate::bundler::Error::ArchError(format!(
                    "unknown architecture `{s}` (expected one of x86, x64, x38, pi, armhf)"
                ))
            })
    }
}

/// Architecture setting of a project node: a single arch or a list.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum ArchSpec {
    /// One architecture
    One(Arch),
    /// Several architectures, processed in order
    Many(Vec<Arch>),
}

impl ArchSpec {
    /// Flatten into a list.
    pub fn to_vec(&self) -> Vec<Arch> {
        match self {
            ArchSpec::One(a) => vec![*a],
            ArchSpec::Many(list) => list.clone(),
        }
    }

    /// First architecture, used where a single one is required.
    pub fn first(&self) -> Option<Arch> {
        match self {
            ArchSpec::One(a) => Some(*a),
            ArchSpec::Many(list) => list.first().copied(),
        }
    }
}

impl fmt::Display for ArchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.to_vec().into_iter().map(Arch::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_dirs_follow_arch() {
        assert_eq!(Arch::X86.build_dir_name(), "build");
        assert_eq!(Arch::X64.build_dir_name(), "build64");
        assert_eq!(Arch::X38.build_dir_name(), "buildx38");
        assert_eq!(Arch::Pi.build_dir_name(), "buildpi");
        assert_eq!(Arch::Armhf.build_dir_name(), "buildarmhf");
    }

    #[test]
    fn parses_names_and_rejects_unknown() {
        assert_eq!("pi".parse::<Arch>().unwrap(), Arch::Pi);
        assert!("arm64".parse::<Arch>().is_err());
    }

    #[test]
    fn arch_spec_accepts_string_or_list() {
        let one: ArchSpec = serde_json::from_str("\"x86\"").unwrap();
        assert_eq!(one.to_vec(), vec![Arch::X86]);
        let many: ArchSpec = serde_json::from_str("[\"x86\", \"x64\"]").unwrap();
        assert_eq!(many.to_vec(), vec![Arch::X86, Arch::X64]);
        assert_eq!(many.first(), Some(Arch::X86));
    }
}
