//! Runtime artifact entries of a Qt build.

use crate::bundler::Arch;
use std::fmt;

/// Target platform naming inside Qt build directories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QtPlatform {
    /// `win`, `.dll`
    Windows,
    /// `lin`, `lib*.so`
    Linux,
    /// `osx`, `lib*.so` like Linux
    Osx,
}

impl QtPlatform {
    /// Platform of the running host.
    pub fn current() -> Self {
        if cfg!(windows) {
            QtPlatform::Windows
        } else if cfg!(target_os = "macos") {
            QtPlatform::Osx
        } else {
            QtPlatform::Linux
        }
    }

    /// Infix used in build directory names.
    pub fn short_name(self) -> &'static str {
        match self {
            QtPlatform::Windows => "win",
            QtPlatform::Linux => "lin",
            QtPlatform::Osx => "osx",
        }
    }
}

impl fmt::Display for QtPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QtPlatform::Windows => "windows",
            QtPlatform::Linux => "linux",
            QtPlatform::Osx => "osx",
        })
    }
}

/// A shared library or plugin shipped with a Qt build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DllEntry {
    /// Modules that pull the library in; empty means always
    pub modules: &'static [&'static str],
    /// Directory below the Qt build (`lib`, `bin`, `plugins`, `qml`, ...)
    pub source_dir: &'static str,
    /// Name without prefix or extension, may contain a subdirectory
    pub base_name: &'static str,
    /// Platforms the entry applies to; empty means all
    pub platforms: &'static [QtPlatform],
    /// Architectures the entry applies to; empty means all
    pub archs: &'static [Arch],
    /// A separate debug build exists
    pub has_dbg_build: bool,
    /// Debug build name when it is not `<base_name>d`
    pub dbg_build_name: Option<&'static str>,
}

impl DllEntry {
    /// Entry for every platform and architecture with a `d` debug build.
    pub const fn new(
        modules: &'static [&'static str],
        source_dir: &'static str,
        base_name: &'static str,
    ) -> Self {
        Self {
            modules,
            source_dir,
            base_name,
            platforms: &[],
            archs: &[],
            has_dbg_build: true,
            dbg_build_name: None,
        }
    }

    /// Restricts the entry to some platforms.
    pub const fn on(mut self, platforms: &'static [QtPlatform]) -> Self {
        self.platforms = platforms;
        self
    }

    /// Restricts the entry to some architectures.
    pub const fn arch(mut self, archs: &'static [Arch]) -> Self {
        self.archs = archs;
        self
    }

    /// Marks the entry as shipping only a release build.
    pub const fn release_only(mut self) -> Self {
        self.has_dbg_build = false;
        self
    }

    /// Whether the entry applies to a platform and architecture.
    pub fn is_required(&self, platform: QtPlatform, arch: Arch) -> bool {
        (self.platforms.is_empty() || self.platforms.contains(&platform))
            && (self.archs.is_empty() || self.archs.contains(&arch))
    }

    /// Name of the build variant to ship.
    pub fn variant_name(&self, debug: bool) -> String {
        if debug && self.has_dbg_build {
            match self.dbg_build_name {
                Some(name) => name.to_string(),
                None => format!("{}d", self.base_name),
            }
        } else {
            self.base_name.to_string()
        }
    }

    /// Source path below the Qt build and destination path below the target.
    ///
    /// Every non-Windows build ships `lib<name>.so`, Qt builds for macOS
    /// included.
    pub fn file_paths(&self, platform: QtPlatform, debug: bool) -> (String, String) {
        let name = self.variant_name(debug);
        let file = match platform {
            QtPlatform::Windows => format!("{name}.dll"),
            QtPlatform::Linux | QtPlatform::Osx => match name.rsplit_once('/') {
                Some((dir, base)) => format!("{dir}/lib{base}.so"),
                None => format!("lib{name}.so"),
            },
        };
        (format!("{}/{file}", self.source_dir), file)
    }
}

/// A non-library file or file set shipped with a Qt build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileEntry {
    /// Modules that pull the file in; empty means always
    pub modules: &'static [&'static str],
    /// Directory below the Qt build
    pub source_dir: &'static str,
    /// File name, or directory to scan when `patterns` is set
    pub base_name: &'static str,
    /// File name patterns to match inside `base_name`
    pub patterns: &'static [&'static str],
    /// Scan subdirectories too
    pub recursive: bool,
}

impl FileEntry {
    /// A single file.
    pub const fn new(
        modules: &'static [&'static str],
        source_dir: &'static str,
        base_name: &'static str,
    ) -> Self {
        Self {
            modules,
            source_dir,
            base_name,
            patterns: &[],
            recursive: true,
        }
    }

    /// A directory scanned for files matching `patterns`.
    pub const fn scan(
        modules: &'static [&'static str],
        source_dir: &'static str,
        base_name: &'static str,
        patterns: &'static [&'static str],
    ) -> Self {
        Self {
            modules,
            source_dir,
            base_name,
            patterns,
            recursive: true,
        }
    }
}

/// Whether an entry with `modules` is used by the `selected` modules.
pub fn uses_module(modules: &[&str], selected: &[String]) -> bool {
    modules.is_empty() || selected.iter().any(|m| modules.contains(&m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUICK: &[&str] = &["quick1", "quick2"];

    #[test]
    fn file_names_follow_platform() {
        let core = DllEntry::new(&[], "bin", "Qt5Core");
        assert_eq!(
            core.file_paths(QtPlatform::Windows, true),
            ("bin/Qt5Cored.dll".to_string(), "Qt5Cored.dll".to_string())
        );

        let plugin = DllEntry::new(&[], "plugins", "imageformats/qjpeg");
        assert_eq!(
            plugin.file_paths(QtPlatform::Linux, false),
            (
                "plugins/imageformats/libqjpeg.so".to_string(),
                "imageformats/libqjpeg.so".to_string()
            )
        );
        assert_eq!(
            plugin.file_paths(QtPlatform::Osx, false),
            plugin.file_paths(QtPlatform::Linux, false)
        );
    }

    #[test]
    fn osx_libraries_use_so_names() {
        let core = DllEntry::new(&[], "lib", "Qt5Core");
        assert_eq!(
            core.file_paths(QtPlatform::Osx, true),
            ("lib/libQt5Cored.so".to_string(), "libQt5Cored.so".to_string())
        );
    }

    #[test]
    fn release_only_entries_ignore_debug() {
        let d3d = DllEntry::new(&["angle"], "bin", "d3dcompiler_47").release_only();
        assert_eq!(d3d.variant_name(true), "d3dcompiler_47");
    }

    #[test]
    fn filters() {
        let entry = DllEntry::new(QUICK, "lib", "Qt5Quick")
            .on(&[QtPlatform::Windows])
            .arch(&[Arch::X86]);
        assert!(entry.is_required(QtPlatform::Windows, Arch::X86));
        assert!(!entry.is_required(QtPlatform::Windows, Arch::X64));
        assert!(!entry.is_required(QtPlatform::Linux, Arch::X86));

        assert!(uses_module(&[], &[]));
        assert!(uses_module(QUICK, &["quick2".to_string()]));
        assert!(!uses_module(&["none"], &["widgets".to_string()]));
    }
}
