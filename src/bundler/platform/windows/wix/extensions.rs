//! WiX extension arguments derived from the namespaces a source uses.

use crate::bundler::{Arch, Result, error::ErrorExt};
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// Always loaded.
pub const DEFAULT_EXTENSION: &[&str] = &["-ext", "%WIX_PATH%/WixUIExtension.dll"];

/// Generated by heat; never declares extensions.
pub const HARVEST_OUTPUT: &str = "dir.wxs";

static XMLNS: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r#"xmlns(?::[\w.-]+)?\s*=\s*["']([^"']+)["']"#));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WixTool {
    Candle,
    Light,
}

struct Extension {
    namespace: &'static str,
    candle: &'static [&'static str],
    light: &'static [&'static str],
}

const EXTENSIONS: &[Extension] = &[
    Extension {
        namespace: "http://schemas.microsoft.com/wix/FirewallExtension",
        candle: &["-ext", "%WIX_PATH%/WixFirewallExtension.dll"],
        light: &["-ext", "%WIX_PATH%/WixFirewallExtension.dll"],
    },
    Extension {
        namespace: "http://schemas.microsoft.com/wix/DifxAppExtension",
        candle: &["-ext", "%WIX_PATH%/WixDifxAppExtension.dll"],
        light: &[
            "-ext",
            "%WIX_PATH%/WixDifxAppExtension.dll",
            "%WIX_PATH%/difxapp_%ARCH%.wixlib",
        ],
    },
    Extension {
        namespace: "http://schemas.microsoft.com/wix/UtilExtension",
        candle: &["-ext", "%WIX_PATH%/WixUtilExtension.dll"],
        light: &["-ext", "%WIX_PATH%/WixUtilExtension.dll"],
    },
    Extension {
        namespace: "http://schemas.microsoft.com/wix/BalExtension",
        candle: &["-ext", "%WIX_PATH%/WixBalExtension.dll"],
        light: &["-ext", "%WIX_PATH%/WixBalExtension.dll"],
    },
];

/// XML namespaces declared in a WiX source.
pub fn namespaces(source: &str) -> Vec<String> {
    let Ok(re) = XMLNS.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(source).map(|c| c[1].to_string()).collect()
}

/// Extension argument groups for `tool`, default first, without repeats.
pub fn extension_groups<'a, I>(namespaces: I, tool: WixTool) -> Vec<&'static [&'static str]>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: Vec<&'static [&'static str]> = vec![DEFAULT_EXTENSION];
    for ns in namespaces {
        let Some(ext) = EXTENSIONS.iter().find(|e| e.namespace == ns) else {
            continue;
        };
        let group = match tool {
            WixTool::Candle => ext.candle,
            WixTool::Light => ext.light,
        };
        if !groups.contains(&group) {
            groups.push(group);
        }
    }
    groups
}

/// Replaces `%WIX_PATH%` and `%ARCH%`.
pub fn substitute(groups: &[&[&str]], wix_bin: &Path, arch: Arch) -> Vec<String> {
    let wix_path = wix_bin.to_string_lossy();
    groups
        .iter()
        .flat_map(|g| g.iter())
        .map(|arg| {
            arg.replace("%WIX_PATH%", &wix_path)
                .replace("%ARCH%", arch.as_str())
        })
        .collect()
}

/// Scans `sources` (except the harvest output) and returns the resolved
/// `-ext` arguments for `tool`.
pub async fn extension_args(
    sources: &[PathBuf],
    tool: WixTool,
    wix_bin: &Path,
    arch: Arch,
) -> Result<Vec<String>> {
    let mut declared = Vec::new();
    for source in sources {
        if source.file_name().is_some_and(|n| n == HARVEST_OUTPUT) {
            continue;
        }
        let text = tokio::fs::read_to_string(source)
            .await
            .fs_context("reading WiX source", source)?;
        declared.extend(namespaces(&text));
    }
    let groups = extension_groups(declared.iter().map(String::as_str), tool);
    Ok(substitute(&groups, wix_bin, arch))
}
