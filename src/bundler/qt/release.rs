//! Supported Qt releases and their artifact tables.
//!
//! Every release starts from the table of the release it was derived from
//! and applies its own changes on top.

use super::table::{DllEntry, FileEntry, QtPlatform};
use crate::bundler::{Arch, Error};
use std::{fmt, str::FromStr};

/// Modules that can be selected for deployment.
pub const MODULES: &[&str] = &[
    "accessible",
    "angle",
    "multimedia",
    "network",
    "print",
    "quick1",
    "quick2",
    "script",
    "test",
    "widgets",
    "xml",
    "serialport",
    "positioning",
    "location",
];

/// Modules deployed when none are selected.
pub const DEFAULT_MODULES: &[&str] = &[
    "widgets",
    "multimedia",
    "network",
    "print",
    "xml",
    "quick1",
    "quick2",
    "test",
    "accessible",
];

const NONE: &[&str] = &["none"];
const BASE: &[&str] = &[];
const ACCESSIBLE: &[&str] = &["accessible"];
const ANGLE: &[&str] = &["angle"];
const MULTIMEDIA: &[&str] = &["multimedia"];
const NETWORK: &[&str] = &["network"];
const PRINT: &[&str] = &["print"];
const QUICK: &[&str] = &["quick1", "quick2"];
const SCRIPT: &[&str] = &["script"];
const TEST: &[&str] = &["test"];
const WIDGETS: &[&str] = &["widgets"];
const XML: &[&str] = &["xml"];
const SERIALPORT: &[&str] = &["serialport"];
const LOCATION: &[&str] = &["location"];
const POSITIONING: &[&str] = &["positioning"];

const WINDOWS: &[QtPlatform] = &[QtPlatform::Windows];
const LINUX: &[QtPlatform] = &[QtPlatform::Linux];
const OSX: &[QtPlatform] = &[QtPlatform::Osx];
const DESKTOP: &[QtPlatform] = &[QtPlatform::Linux, QtPlatform::Windows, QtPlatform::Osx];

const BASE_DLLS: &[DllEntry] = &[
    DllEntry::new(XML, "lib", "Qt5Xml"),
    DllEntry::new(XML, "lib", "Qt5XmlPatterns"),
    DllEntry::new(NONE, "lib", "Qt5CLucene"),
    DllEntry::new(BASE, "lib", "Qt5Concurrent"),
    DllEntry::new(BASE, "lib", "Qt5Core"),
    DllEntry::new(QUICK, "lib", "Qt5Declarative"),
    DllEntry::new(WIDGETS, "lib", "Qt5Gui"),
    DllEntry::new(NONE, "lib", "Qt5Help"),
    DllEntry::new(MULTIMEDIA, "lib", "Qt5Multimedia"),
    DllEntry::new(QUICK, "lib", "Qt5MultimediaQuick_p"),
    DllEntry::new(MULTIMEDIA, "lib", "Qt5MultimediaWidgets"),
    DllEntry::new(NETWORK, "lib", "Qt5Network"),
    DllEntry::new(BASE, "lib", "Qt5OpenGL").on(LINUX),
    DllEntry::new(PRINT, "lib", "Qt5PrintSupport"),
    DllEntry::new(QUICK, "lib", "Qt5Qml"),
    DllEntry::new(QUICK, "lib", "Qt5Quick"),
    DllEntry::new(QUICK, "lib", "Qt5QuickParticles"),
    DllEntry::new(TEST, "lib", "Qt5QuickTest"),
    DllEntry::new(SCRIPT, "lib", "Qt5Script"),
    DllEntry::new(SCRIPT, "lib", "Qt5ScriptTools"),
    DllEntry::new(NONE, "lib", "Qt5Sensors"),
    DllEntry::new(NONE, "lib", "Qt5SerialPort"),
    DllEntry::new(BASE, "lib", "Qt5Sql").on(LINUX),
    DllEntry::new(BASE, "lib", "Qt5Svg"),
    DllEntry::new(TEST, "lib", "Qt5Test"),
    DllEntry::new(QUICK, "lib", "Qt5V8"),
    DllEntry::new(WIDGETS, "lib", "Qt5Widgets"),
    DllEntry::new(ANGLE, "lib", "libEGL").on(WINDOWS),
    DllEntry::new(ANGLE, "lib", "libGLESv2").on(WINDOWS),
    DllEntry::new(ANGLE, "3rdparty/x86", "D3DCompiler_43")
        .on(WINDOWS)
        .arch(&[Arch::X86])
        .release_only(),
    DllEntry::new(ANGLE, "3rdparty/x64", "D3DCompiler_43")
        .on(WINDOWS)
        .arch(&[Arch::X64])
        .release_only(),
    DllEntry::new(BASE, "plugins", "imageformats/qtiff"),
    DllEntry::new(BASE, "plugins", "imageformats/qwbmp"),
    DllEntry::new(BASE, "plugins", "imageformats/qgif"),
    DllEntry::new(BASE, "plugins", "imageformats/qico"),
    DllEntry::new(BASE, "plugins", "imageformats/qjpeg"),
    DllEntry::new(BASE, "plugins", "imageformats/qmng"),
    DllEntry::new(BASE, "plugins", "imageformats/qsvg"),
    DllEntry::new(BASE, "plugins", "imageformats/qtga"),
    DllEntry::new(QUICK, "plugins", "qmltooling/qmldbg_qtquick2"),
    DllEntry::new(QUICK, "plugins", "qmltooling/qmldbg_tcp"),
    DllEntry::new(BASE, "plugins", "iconengines/qsvgicon"),
    DllEntry::new(BASE, "plugins", "platforms/qminimal").on(DESKTOP),
    DllEntry::new(BASE, "plugins", "platforms/qoffscreen").on(DESKTOP),
    DllEntry::new(BASE, "plugins", "platforms/qxcb").on(LINUX),
    DllEntry::new(BASE, "plugins", "platforms/qwindows").on(WINDOWS),
    DllEntry::new(PRINT, "plugins", "printsupport/windowsprintersupport").on(WINDOWS),
    DllEntry::new(PRINT, "plugins", "printsupport/cocoaprintersupport").on(OSX),
    DllEntry::new(QUICK, "qml", "QtQuick.2/qtquick2plugin").on(DESKTOP),
    DllEntry::new(QUICK, "qml", "Qt/labs/folderlistmodel/qmlfolderlistmodelplugin").on(DESKTOP),
    DllEntry::new(QUICK, "qml", "Qt/labs/settings/qmlsettingsplugin").on(DESKTOP),
    DllEntry::new(QUICK, "qml", "QtGraphicalEffects/private/qtgraphicaleffectsprivate").on(DESKTOP),
    DllEntry::new(QUICK, "qml", "QtGraphicalEffects/qtgraphicaleffectsplugin").on(DESKTOP),
    DllEntry::new(ACCESSIBLE, "plugins", "accessible/qtaccessiblequick"),
    DllEntry::new(ACCESSIBLE, "plugins", "accessible/qtaccessiblewidgets"),
    DllEntry::new(SERIALPORT, "lib", "QT5SerialPort"),
    DllEntry::new(BASE, "lib", "Qt5DBus").on(LINUX),
    DllEntry::new(BASE, "lib", "Qt5XcbQpa").on(LINUX),
    DllEntry::new(BASE, "plugins", "xcbglintegrations/qxcb-glx-integration").on(LINUX),
    DllEntry::new(BASE, "plugins", "xcbglintegrations/qxcb-egl-integration").on(LINUX),
    // QtQuick runtime dependencies on Linux
    DllEntry::new(QUICK, "lib", "Qt53DRender").on(LINUX),
    DllEntry::new(QUICK, "lib", "Qt53DCore").on(LINUX),
    DllEntry::new(QUICK, "lib", "Qt5QuickControls2"),
    DllEntry::new(QUICK, "lib", "Qt53DInput").on(LINUX),
    DllEntry::new(QUICK, "lib", "Qt53DLogic").on(LINUX),
    DllEntry::new(QUICK, "lib", "Qt5QuickTemplates2"),
    DllEntry::new(QUICK, "lib", "Qt5Gamepad").on(LINUX),
    DllEntry::new(QUICK, "lib", "Qt53DQuickScene2D").on(LINUX),
];

const BASE_FILES: &[FileEntry] = &[
    FileEntry::new(QUICK, "qml", "QtQuick.2/qmldir"),
    FileEntry::new(QUICK, "qml", "Qt/labs/folderlistmodel/qmldir"),
    FileEntry::new(QUICK, "qml", "Qt/labs/settings/qmldir"),
    FileEntry::scan(QUICK, "qml", "QtGraphicalEffects", &["qmldir", "*.qml"]),
];

/// A supported Qt release.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QtRelease {
    /// 5.1.1
    V5_1_1,
    /// 5.2.0
    V5_2_0,
    /// 5.3.0
    V5_3_0,
    /// 5.3.1
    V5_3_1,
    /// 5.6.0
    V5_6_0,
    /// 5.9.0
    V5_9_0,
    /// 5.9.1
    V5_9_1,
    /// 5.9.2
    V5_9_2,
    /// 5.12.5
    V5_12_5,
    /// 5.12.6
    #[default]
    V5_12_6,
    /// 5.14.0
    V5_14_0,
}

impl QtRelease {
    /// Every release, default first.
    pub const ALL: [QtRelease; 11] = [
        QtRelease::V5_12_6,
        QtRelease::V5_12_5,
        QtRelease::V5_6_0,
        QtRelease::V5_9_0,
        QtRelease::V5_9_1,
        QtRelease::V5_9_2,
        QtRelease::V5_3_1,
        QtRelease::V5_3_0,
        QtRelease::V5_2_0,
        QtRelease::V5_1_1,
        QtRelease::V5_14_0,
    ];

    /// Version string.
    pub fn id(self) -> &'static str {
        match self {
            QtRelease::V5_1_1 => "5.1.1",
            QtRelease::V5_2_0 => "5.2.0",
            QtRelease::V5_3_0 => "5.3.0",
            QtRelease::V5_3_1 => "5.3.1",
            QtRelease::V5_6_0 => "5.6.0",
            QtRelease::V5_9_0 => "5.9.0",
            QtRelease::V5_9_1 => "5.9.1",
            QtRelease::V5_9_2 => "5.9.2",
            QtRelease::V5_12_5 => "5.12.5",
            QtRelease::V5_12_6 => "5.12.6",
            QtRelease::V5_14_0 => "5.14.0",
        }
    }

    /// Display name.
    pub fn name(self) -> String {
        format!("Qt {} Open Source", self.id())
    }

    /// Release whose table this one starts from.
    pub fn parent(self) -> Option<QtRelease> {
        match self {
            QtRelease::V5_1_1 => None,
            QtRelease::V5_2_0 => Some(QtRelease::V5_1_1),
            QtRelease::V5_3_0 => Some(QtRelease::V5_2_0),
            QtRelease::V5_3_1 => Some(QtRelease::V5_3_0),
            QtRelease::V5_6_0 => Some(QtRelease::V5_3_1),
            QtRelease::V5_9_0 => Some(QtRelease::V5_6_0),
            QtRelease::V5_9_1 => Some(QtRelease::V5_9_0),
            QtRelease::V5_9_2 => Some(QtRelease::V5_9_1),
            QtRelease::V5_12_5 | QtRelease::V5_12_6 => Some(QtRelease::V5_9_2),
            QtRelease::V5_14_0 => Some(QtRelease::V5_12_6),
        }
    }

    fn at_least(self, other: QtRelease) -> bool {
        let mut current = Some(self);
        while let Some(release) = current {
            if release == other {
                return true;
            }
            current = release.parent();
        }
        false
    }

    /// Libraries shipped by this release on `platform`.
    pub fn dlls(self, platform: QtPlatform) -> Vec<DllEntry> {
        let mut dlls = match self.parent() {
            Some(parent) => parent.dlls(platform),
            None => BASE_DLLS.to_vec(),
        };

        match self {
            QtRelease::V5_2_0 => {
                drop_matching(&mut dlls, &["Qt5V8"]);
                dlls.extend([
                    DllEntry::new(LOCATION, "lib", "Qt5Location"),
                    DllEntry::new(LOCATION, "qml", "QtLocation/declarative_location").on(DESKTOP),
                    DllEntry::new(LOCATION, "plugins", "geoservices/qtgeoservices_osm").on(DESKTOP),
                    DllEntry::new(LOCATION, "plugins", "geoservices/qtgeoservices_itemsoverlay")
                        .on(DESKTOP),
                    DllEntry::new(POSITIONING, "lib", "Qt5Positioning"),
                    DllEntry::new(POSITIONING, "qml", "QtPositioning/declarative_positioning")
                        .on(DESKTOP),
                ]);
            }
            QtRelease::V5_3_1 if platform == QtPlatform::Windows => {
                for dll in dlls.iter_mut().filter(|d| d.source_dir == "lib") {
                    dll.source_dir = "bin";
                }
            }
            QtRelease::V5_6_0 => drop_matching(
                &mut dlls,
                &[
                    "Qt5Declarative",
                    "accessible/qtaccessiblewidgets",
                    "accessible/qtaccessiblequick",
                    "imageformats/qmng",
                    "qmltooling/qmldbg_qtquick2",
                ],
            ),
            QtRelease::V5_12_5 => {
                drop_matching(&mut dlls, &["Qt5MultimediaQuick_p"]);
                dlls.extend([
                    DllEntry::new(QUICK, "bin", "Qt5MultimediaQuick"),
                    DllEntry::new(POSITIONING, "bin", "Qt5PositioningQuick"),
                    DllEntry::new(BASE, "plugins", "styles/qwindowsvistastyle"),
                ]);
            }
            QtRelease::V5_12_6 => {
                drop_matching(&mut dlls, &["Qt5MultimediaQuick_p", "D3DCompiler_43"]);
                dlls.extend([
                    DllEntry::new(QUICK, "bin", "Qt5MultimediaQuick"),
                    DllEntry::new(POSITIONING, "bin", "Qt5PositioningQuick"),
                    DllEntry::new(ANGLE, "bin", "d3dcompiler_47")
                        .on(WINDOWS)
                        .release_only(),
                    DllEntry::new(BASE, "plugins", "styles/qwindowsvistastyle"),
                ]);
            }
            QtRelease::V5_14_0 => dlls.extend([
                DllEntry::new(QUICK, "bin", "Qt5QmlModels"),
                DllEntry::new(QUICK, "bin", "Qt5QmlWorkerScript"),
                DllEntry::new(QUICK, "qml", "QtQml/qmlplugin").on(DESKTOP),
            ]),
            _ => {}
        }
        dlls
    }

    /// Extra files shipped by this release.
    pub fn files(self) -> Vec<FileEntry> {
        let mut files = match self.parent() {
            Some(parent) => parent.files(),
            None => BASE_FILES.to_vec(),
        };
        match self {
            QtRelease::V5_2_0 => files.extend([
                FileEntry::new(LOCATION, "qml", "QtLocation/qmldir"),
                FileEntry::new(POSITIONING, "qml", "QtPositioning/qmldir"),
            ]),
            QtRelease::V5_14_0 => files.push(FileEntry::new(QUICK, "qml", "QtQml/qmldir")),
            _ => {}
        }
        files
    }

    /// Directory name of a Qt build: `<id>_<platform><bits>[_<special>]`.
    ///
    /// From 5.9.0 on the special build is no longer part of the name.
    /// Only x86 and x64 builds exist.
    pub fn build_name(
        self,
        platform: QtPlatform,
        arch: Arch,
        special_build: Option<&str>,
    ) -> Option<String> {
        let bits = match arch {
            Arch::X64 => "64",
            Arch::X86 => "32",
            _ => return None,
        };
        let mut name = format!("{}_{}{bits}", self.id(), platform.short_name());
        if let Some(special) = special_build.filter(|s| !s.is_empty()) {
            if !self.at_least(QtRelease::V5_9_0) {
                name.push('_');
                name.push_str(special);
            }
        }
        Some(name)
    }
}

fn drop_matching(dlls: &mut Vec<DllEntry>, names: &[&str]) {
    dlls.retain(|dll| !names.iter().any(|name| dll.base_name.contains(name)));
}

impl fmt::Display for QtRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for QtRelease {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QtRelease::ALL
            .into_iter()
            .find(|r| r.id() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = QtRelease::ALL.iter().map(|r| r.id()).collect();
                Error::GenericError(format!(
                    "unknown Qt version `{s}` (expected one of {})",
                    known.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(dlls: &[DllEntry]) -> Vec<&'static str> {
        dlls.iter().map(|d| d.base_name).collect()
    }

    #[test]
    fn later_releases_inherit_and_adjust() {
        let base = names(&QtRelease::V5_1_1.dlls(QtPlatform::Windows));
        assert!(base.contains(&"Qt5V8"));

        let v520 = names(&QtRelease::V5_2_0.dlls(QtPlatform::Windows));
        assert!(!v520.contains(&"Qt5V8"));
        assert!(v520.contains(&"Qt5Location"));

        let v560 = names(&QtRelease::V5_6_0.dlls(QtPlatform::Windows));
        assert!(!v560.contains(&"Qt5Declarative"));
        assert!(!v560.contains(&"imageformats/qmng"));
        assert!(v560.contains(&"Qt5Positioning"));
    }

    #[test]
    fn windows_libraries_move_to_bin() {
        let dlls = QtRelease::V5_3_1.dlls(QtPlatform::Windows);
        let core = dlls.iter().find(|d| d.base_name == "Qt5Core").unwrap();
        assert_eq!(core.source_dir, "bin");

        let dlls = QtRelease::V5_3_1.dlls(QtPlatform::Linux);
        let core = dlls.iter().find(|d| d.base_name == "Qt5Core").unwrap();
        assert_eq!(core.source_dir, "lib");
    }

    #[test]
    fn v5_12_6_swaps_the_shader_compiler() {
        let v5126 = names(&QtRelease::V5_12_6.dlls(QtPlatform::Windows));
        assert!(!v5126.contains(&"D3DCompiler_43"));
        assert!(v5126.contains(&"d3dcompiler_47"));
        assert!(!v5126.contains(&"Qt5MultimediaQuick_p"));
        assert!(v5126.contains(&"Qt5MultimediaQuick"));

        let v5125 = names(&QtRelease::V5_12_5.dlls(QtPlatform::Windows));
        assert!(v5125.contains(&"D3DCompiler_43"));

        let v5140 = QtRelease::V5_14_0;
        assert!(names(&v5140.dlls(QtPlatform::Windows)).contains(&"Qt5QmlModels"));
        assert!(v5140.files().iter().any(|f| f.base_name == "QtQml/qmldir"));
    }

    #[test]
    fn build_names() {
        assert_eq!(
            QtRelease::V5_1_1
                .build_name(QtPlatform::Windows, Arch::X64, Some("angle"))
                .as_deref(),
            Some("5.1.1_win64_angle")
        );
        assert_eq!(
            QtRelease::V5_12_6
                .build_name(QtPlatform::Linux, Arch::X86, Some("angle"))
                .as_deref(),
            Some("5.12.6_lin32")
        );
        assert_eq!(QtRelease::V5_12_6.build_name(QtPlatform::Osx, Arch::Pi, None), None);
    }

    #[test]
    fn parses_release_ids() {
        assert_eq!("5.9.2".parse::<QtRelease>().unwrap(), QtRelease::V5_9_2);
        assert!("6.0.0".parse::<QtRelease>().is_err());
        assert_eq!(QtRelease::default().name(), "Qt 5.12.6 Open Source");
    }
}
