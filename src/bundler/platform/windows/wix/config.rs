//! `wix_config.json`: per-installer additions to the WiX command lines.

use crate::bundler::Result;
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path, path::PathBuf};

pub const CONFIG_FILE: &str = "wix_config.json";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WixConfig {
    /// Directories to harvest, each with extra heat arguments
    pub heat: Option<BTreeMap<String, Vec<String>>>,
    /// Extra candle arguments
    pub candle: Option<Vec<String>>,
    /// Extra light arguments
    pub light: Option<Vec<String>>,
    pub version: Option<VersionConfig>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VersionConfig {
    /// Version header, relative to the workspace
    pub version_info_file: Option<PathBuf>,
}

impl WixConfig {
    /// Reads `wix_config.json` from `dir`. A missing file is an empty config.
    pub async fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(crate::bundler::Error::Fs {
                context: "reading WiX config",
                path,
                error: e,
            }),
        }
    }

    pub fn version_info_file(&self) -> Option<&Path> {
        self.version
            .as_ref()
            .and_then(|v| v.version_info_file.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_config_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(WixConfig::load(dir.path()).await.unwrap(), WixConfig::default());
    }

    #[tokio::test]
    async fn parses_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{
                "heat": {"x64": ["-cg", "AppFiles", "-out", "app.wxs"], "doc": []},
                "candle": ["-dProduct=Suite"],
                "version": {"version_info_file": "inc/MajorVersion.h"}
            }"#,
        )
        .unwrap();
        let config = WixConfig::load(dir.path()).await.unwrap();
        let heat = config.heat.as_ref().unwrap();
        assert_eq!(heat.keys().collect::<Vec<_>>(), ["doc", "x64"]);
        assert_eq!(config.candle.as_deref(), Some(&["-dProduct=Suite".to_string()][..]));
        assert!(config.light.is_none());
        assert_eq!(config.version_info_file(), Some(Path::new("inc/MajorVersion.h")));
    }
}
