//! Build directory resolution and the build-dir guard.

use crate::bundler::{
    Arch, Error, Result,
    utils::fs::{create_dir_all, remove_file},
};
use std::path::{Path, PathBuf};

/// Name of the build directory for `arch`, unless overridden.
pub fn build_dir_name(arch: Arch, override_dir: Option<&Path>) -> PathBuf {
    match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from(arch.build_dir_name()),
    }
}

/// A per-architecture build directory below a project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildDir {
    path: PathBuf,
    explicit: bool,
}

impl BuildDir {
    /// `<project_dir>/<build_dir_name>`; absolute overrides are used as is.
    pub fn resolve(project_dir: &Path, arch: Arch, override_dir: Option<&Path>) -> Self {
        Self {
            path: project_dir.join(build_dir_name(arch, override_dir)),
            explicit: override_dir.is_some(),
        }
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Refuses directories that do not look like build directories.
    ///
    /// Configure and cache cleaning write into the directory, so they only
    /// run in a directory whose name contains `build` or one that was named
    /// explicitly.
    pub fn ensure_valid(&self) -> Result<()> {
        let looks_like_build = self
            .path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().contains("build"));
        if looks_like_build || self.explicit {
            Ok(())
        } else {
            Err(Error::NotBuildDir(self.path.clone()))
        }
    }

    /// Creates the directory if needed.
    pub async fn create(&self, dry_run: bool) -> Result<()> {
        if dry_run {
            println!("mkdir {}", self.path.display());
            return Ok(());
        }
        create_dir_all(&self.path, false).await
    }

    /// Removes `CMakeCache.txt`; a missing cache is fine.
    pub async fn clean_cache(&self) -> Result<()> {
        self.ensure_valid()?;
        remove_file(&self.path.join("CMakeCache.txt")).await
    }

    /// Deletes object files and static libraries below the directory.
    ///
    /// Returns the removed files. A missing directory yields nothing.
    pub async fn remove_intermediates(&self) -> Result<Vec<PathBuf>> {
        if !self.path.is_dir() {
            return Ok(Vec::new());
        }
        let mut removed = Vec::new();
        for entry in walkdir::WalkDir::new(&self.path) {
            let entry = entry?;
            let is_intermediate = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == "obj" || ext == "lib");
            if is_intermediate {
                remove_file(entry.path()).await?;
                removed.push(entry.into_path());
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins() {
        assert_eq!(build_dir_name(Arch::X64, None), PathBuf::from("build64"));
        assert_eq!(
            build_dir_name(Arch::X64, Some(Path::new("out"))),
            PathBuf::from("out")
        );
    }

    #[test]
    fn guard_accepts_build_names_and_overrides() {
        let project = Path::new("/src/app");
        assert!(BuildDir::resolve(project, Arch::X86, None).ensure_valid().is_ok());
        assert!(
            BuildDir::resolve(project, Arch::X64, Some(Path::new("out")))
                .ensure_valid()
                .is_ok()
        );

        let bogus = BuildDir {
            path: PathBuf::from("/src/app"),
            explicit: false,
        };
        assert!(matches!(bogus.ensure_valid(), Err(Error::NotBuildDir(_))));
    }

    #[tokio::test]
    async fn clean_cache_removes_only_the_cache() {
        let project = tempfile::tempdir().unwrap();
        let dir = BuildDir::resolve(project.path(), Arch::X64, None);
        dir.create(false).await.unwrap();
        std::fs::write(dir.path().join("CMakeCache.txt"), "").unwrap();
        std::fs::write(dir.path().join("app.sln"), "").unwrap();

        dir.clean_cache().await.unwrap();
        dir.clean_cache().await.unwrap();
        assert!(!dir.path().join("CMakeCache.txt").exists());
        assert!(dir.path().join("app.sln").exists());
    }

    #[tokio::test]
    async fn intermediates_are_removed_recursively() {
        let project = tempfile::tempdir().unwrap();
        let dir = BuildDir::resolve(project.path(), Arch::X86, None);
        let nested = dir.path().join("src").join("core.dir");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("main.obj"), "").unwrap();
        std::fs::write(dir.path().join("core.lib"), "").unwrap();
        std::fs::write(dir.path().join("core.dll"), "").unwrap();

        let removed = dir.remove_intermediates().await.unwrap();
        assert_eq!(removed.len(), 2);
        assert!(dir.path().join("core.dll").exists());
        assert!(!nested.join("main.obj").exists());
    }
}
