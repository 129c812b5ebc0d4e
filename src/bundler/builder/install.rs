//! Copy rules for packaging files.

use crate::{
    bail,
    bundler::{
        Result,
        utils::fs::{copy_file, copy_glob, copy_tree, create_dir_all, remove_dir_all},
    },
};
use std::path::{Path, PathBuf};

/// How files get from a source directory into an install directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CopyRule {
    /// `*.*`: every file whose name contains a dot, flat
    AllFiles,
    /// `* *`: the whole directory, replacing the destination
    WholeDir,
    /// `[dir/]*.ext`: matching files, flat
    Glob(String),
    /// Literal file names; a missing file is an error
    Files(Vec<String>),
}

impl CopyRule {
    /// Picks the rule from a list of patterns.
    ///
    /// The first wildcard pattern decides; a list without wildcards is a
    /// list of literal files.
    pub fn parse<S: AsRef<str>>(patterns: &[S]) -> Self {
        for pattern in patterns.iter().map(AsRef::as_ref) {
            if pattern.contains("*.*") {
                return CopyRule::AllFiles;
            }
            if pattern.contains("* *") {
                return CopyRule::WholeDir;
            }
            if pattern.contains("*.") {
                return CopyRule::Glob(pattern.to_string());
            }
        }
        CopyRule::Files(patterns.iter().map(|p| p.as_ref().to_string()).collect())
    }

    /// Copies from `src` into `dest`, creating `dest` first.
    pub async fn apply(&self, src: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
        create_dir_all(dest, false).await?;

        match self {
            CopyRule::AllFiles => copy_glob(src, "*", dest).await,
            CopyRule::WholeDir => {
                remove_dir_all(dest).await?;
                copy_tree(src, dest, |_| false).await
            }
            CopyRule::Glob(pattern) => copy_glob(src, pattern, dest).await,
            CopyRule::Files(files) => {
                let mut copied = Vec::with_capacity(files.len());
                for file in files {
                    let from = src.join(file);
                    if !from.exists() {
                        bail!("{} does not exist", from.display());
                    }
                    let to = dest.join(file);
                    copy_file(&from, &to).await?;
                    copied.push(to);
                }
                Ok(copied)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_wildcard_decides() {
        assert_eq!(CopyRule::parse(&["*.*"]), CopyRule::AllFiles);
        assert_eq!(CopyRule::parse(&["* *"]), CopyRule::WholeDir);
        assert_eq!(
            CopyRule::parse(&["disk1/*.cab"]),
            CopyRule::Glob("disk1/*.cab".into())
        );
        assert_eq!(
            CopyRule::parse(&["a.txt", "b.txt"]),
            CopyRule::Files(vec!["a.txt".into(), "b.txt".into()])
        );
    }

    #[tokio::test]
    async fn all_files_skips_dirs_and_extensionless_names() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("product.wxs"), "").unwrap();
        std::fs::write(src.path().join("LICENSE"), "").unwrap();
        std::fs::create_dir(src.path().join("sub.dir")).unwrap();

        let copied = CopyRule::AllFiles.apply(src.path(), dest.path()).await.unwrap();
        assert_eq!(copied, vec![dest.path().join("product.wxs")]);
        assert!(!dest.path().join("LICENSE").exists());
    }

    #[tokio::test]
    async fn glob_copies_flat() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::create_dir(src.path().join("disk1")).unwrap();
        std::fs::write(src.path().join("disk1").join("drv.cab"), "").unwrap();

        CopyRule::parse(&["disk1/*.cab"])
            .apply(src.path(), dest.path())
            .await
            .unwrap();
        assert!(dest.path().join("drv.cab").exists());
    }

    #[tokio::test]
    async fn whole_dir_replaces_destination() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::create_dir(src.path().join("bin")).unwrap();
        std::fs::write(src.path().join("bin").join("app.exe"), "").unwrap();
        std::fs::write(dest.path().join("stale.txt"), "").unwrap();

        CopyRule::WholeDir.apply(src.path(), dest.path()).await.unwrap();
        assert!(dest.path().join("bin").join("app.exe").exists());
        assert!(!dest.path().join("stale.txt").exists());
    }

    #[tokio::test]
    async fn missing_literal_file_fails() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let err = CopyRule::parse(&["missing.txt"])
            .apply(src.path(), dest.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
