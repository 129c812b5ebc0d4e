//! Generator selection and configure arguments.
//!
//! Which generator is used depends on the host and the requested flavour;
//! the Visual Studio generator additionally derives its name, toolset and
//! platform arguments from the studio version and architecture.

use super::CMakeVersion;
use crate::bundler::{Arch, BuildType, VsVersion};
use std::path::Path;

/// Operating system the build runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostPlatform {
    /// Windows: Visual Studio, JOM or Ninja
    Windows,
    /// Linux: Makefiles or Ninja
    Linux,
    /// macOS: Makefiles or Xcode
    MacOs,
}

impl HostPlatform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            HostPlatform::Windows
        } else if cfg!(target_os = "macos") {
            HostPlatform::MacOs
        } else {
            HostPlatform::Linux
        }
    }
}

/// Generator flavour requested on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GeneratorFlavor {
    /// Host default
    #[default]
    Native,
    /// NMake Makefiles JOM (Windows)
    Jom,
    /// Ninja
    Ninja,
    /// Xcode project (macOS)
    Xcode,
}

/// CMake generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Generator {
    /// Visual Studio solution
    VisualStudio(VsVersion),
    /// NMake Makefiles JOM
    Jom,
    /// Ninja
    Ninja,
    /// Xcode project
    Xcode,
    /// Unix Makefiles
    Makefiles,
}

impl Generator {
    /// Generator for a host and requested flavour.
    pub fn select(host: HostPlatform, flavor: GeneratorFlavor, vs: VsVersion) -> Self {
        match (host, flavor) {
            (HostPlatform::Windows, GeneratorFlavor::Jom) => Generator::Jom,
            (HostPlatform::Windows, GeneratorFlavor::Ninja) => Generator::Ninja,
            (HostPlatform::Windows, _) => Generator::VisualStudio(vs),
            (HostPlatform::Linux, GeneratorFlavor::Ninja) => Generator::Ninja,
            (HostPlatform::MacOs, GeneratorFlavor::Xcode) => Generator::Xcode,
            _ => Generator::Makefiles,
        }
    }

    /// Builds with MSBuild instead of `cmake --build`.
    pub fn uses_msbuild(&self) -> bool {
        matches!(self, Generator::VisualStudio(_))
    }

    /// Needs the build type at build time (`--config`).
    pub fn is_multi_config(&self) -> bool {
        matches!(self, Generator::VisualStudio(_) | Generator::Xcode)
    }

    /// Configure arguments up to, not including, the extra parameters.
    ///
    /// `toolchain` is only used for Raspberry Pi Makefile builds.
    pub fn configure_args(
        &self,
        arch: Arch,
        build_type: BuildType,
        project_dir: &Path,
        toolset: Option<&str>,
        cmake_version: Option<CMakeVersion>,
        toolchain: Option<&Path>,
    ) -> Vec<String> {
        let build_type = format!("-DCMAKE_BUILD_TYPE={build_type}");
        let project = project_dir.display().to_string();

        match self {
            Generator::VisualStudio(vs) => {
                let mut args = vec![build_type, project, "-G".into(), vs_generator_name(*vs, arch)];
                args.extend(toolset_arg(*vs, arch, toolset, cmake_version));
                args.extend(vs_arch_args(*vs, arch));
                args
            }
            Generator::Jom => vec![build_type, "-G".into(), "NMake Makefiles JOM".into(), project],
            Generator::Ninja => vec![build_type, "-G".into(), "Ninja".into(), project],
            Generator::Xcode => vec![
                build_type,
                "-G".into(),
                "Xcode".into(),
                format!("-DBUILD_ARCH={arch}"),
                project,
            ],
            Generator::Makefiles => {
                let mut args = Vec::new();
                if arch == Arch::Pi {
                    if let Some(file) = toolchain {
                        args.push(format!("-DCMAKE_TOOLCHAIN_FILE={}", file.display()));
                    }
                }
                args.extend([build_type, format!("-DBUILD_ARCH={arch}"), project]);
                args
            }
        }
    }
}

/// `Visual Studio <major> <year>`, with ` Win64` for x64 up to 2017.
pub fn vs_generator_name(vs: VsVersion, arch: Arch) -> String {
    let name = format!("Visual Studio {} {}", vs.major(), vs.year());
    if vs.major() <= 15 && arch == Arch::X64 {
        format!("{name} Win64")
    } else {
        name
    }
}

/// `-T<toolset>[,host=x64]` for Visual Studio 2017 and later.
///
/// The 64-bit host toolchain is requested for x86 and x64 builds once CMake
/// understands it.
pub fn toolset_arg(
    vs: VsVersion,
    arch: Arch,
    toolset: Option<&str>,
    cmake_version: Option<CMakeVersion>,
) -> Option<String> {
    if vs.major() < 15 {
        return None;
    }

    let mut parts: Vec<&str> = toolset.into_iter().collect();
    let host_toolset = cmake_version.is_some_and(|v| v >= CMakeVersion::HOST_TOOLSET);
    if host_toolset && matches!(arch, Arch::X86 | Arch::X64) {
        parts.push("host=x64");
    }

    if parts.is_empty() {
        None
    } else {
        Some(format!("-T{}", parts.join(",")))
    }
}

/// `-A x64` / `-A Win32` for Visual Studio 2019 and later.
pub fn vs_arch_args(vs: VsVersion, arch: Arch) -> Vec<String> {
    if vs.major() < 16 {
        return Vec::new();
    }
    match arch {
        Arch::X64 => vec!["-A".into(), "x64".into()],
        Arch::X86 => vec!["-A".into(), "Win32".into()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_CMAKE: Option<CMakeVersion> = Some(CMakeVersion { major: 3, minor: 16 });
    const OLD_CMAKE: Option<CMakeVersion> = Some(CMakeVersion { major: 3, minor: 5 });

    fn vs(year: &str) -> VsVersion {
        year.parse().unwrap()
    }

    #[test]
    fn generator_names() {
        assert_eq!(vs_generator_name(vs("2015"), Arch::X64), "Visual Studio 14 2015 Win64");
        assert_eq!(vs_generator_name(vs("2017"), Arch::X86), "Visual Studio 15 2017");
        assert_eq!(vs_generator_name(vs("2019"), Arch::X64), "Visual Studio 16 2019");
    }

    #[test]
    fn toolset_rules() {
        assert_eq!(toolset_arg(vs("2015"), Arch::X64, Some("v140"), NEW_CMAKE), None);
        assert_eq!(
            toolset_arg(vs("2019"), Arch::X64, Some("v141"), NEW_CMAKE).as_deref(),
            Some("-Tv141,host=x64")
        );
        assert_eq!(
            toolset_arg(vs("2019"), Arch::X86, None, NEW_CMAKE).as_deref(),
            Some("-Thost=x64")
        );
        assert_eq!(
            toolset_arg(vs("2017"), Arch::X64, Some("v141"), OLD_CMAKE).as_deref(),
            Some("-Tv141")
        );
        assert_eq!(toolset_arg(vs("2017"), Arch::X64, None, OLD_CMAKE), None);
    }

    #[test]
    fn arch_flag_only_for_2019_and_later() {
        assert!(vs_arch_args(vs("2017"), Arch::X64).is_empty());
        assert_eq!(vs_arch_args(vs("2019"), Arch::X86), vec!["-A", "Win32"]);
        assert_eq!(vs_arch_args(vs("2022"), Arch::X64), vec!["-A", "x64"]);
    }

    #[test]
    fn host_selects_generator() {
        let v = VsVersion::default();
        assert_eq!(
            Generator::select(HostPlatform::Windows, GeneratorFlavor::Native, v),
            Generator::VisualStudio(v)
        );
        assert_eq!(
            Generator::select(HostPlatform::Linux, GeneratorFlavor::Xcode, v),
            Generator::Makefiles
        );
        assert_eq!(
            Generator::select(HostPlatform::MacOs, GeneratorFlavor::Xcode, v),
            Generator::Xcode
        );
        assert_eq!(
            Generator::select(HostPlatform::Linux, GeneratorFlavor::Ninja, v),
            Generator::Ninja
        );
    }

    #[test]
    fn visual_studio_configure_line() {
        let args = Generator::VisualStudio(vs("2019")).configure_args(
            Arch::X64,
            BuildType::Release,
            Path::new("/src/app"),
            Some("v141"),
            NEW_CMAKE,
            None,
        );
        assert_eq!(
            args,
            vec![
                "-DCMAKE_BUILD_TYPE=Release",
                "/src/app",
                "-G",
                "Visual Studio 16 2019",
                "-Tv141,host=x64",
                "-A",
                "x64"
            ]
        );
    }

    #[test]
    fn pi_makefiles_prepend_toolchain() {
        let args = Generator::Makefiles.configure_args(
            Arch::Pi,
            BuildType::Debug,
            Path::new("/src/app"),
            None,
            None,
            Some(Path::new("/ws/build_util/cmake/Toolchain-arm-raspberry.cmake")),
        );
        assert_eq!(
            args,
            vec![
                "-DCMAKE_TOOLCHAIN_FILE=/ws/build_util/cmake/Toolchain-arm-raspberry.cmake",
                "-DCMAKE_BUILD_TYPE=Debug",
                "-DBUILD_ARCH=pi",
                "/src/app"
            ]
        );
    }
}
