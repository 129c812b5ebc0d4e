//! File system utilities for packaging.
//!
//! Idempotent create/remove helpers plus the copy primitives every step
//! relies on: single files, merged directory trees and glob selections.
//! Copies overwrite existing destinations and keep the source modification
//! time.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Fs {
            context: "removing directory",
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Removes a file if it exists.
pub async fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Fs {
            context: "removing file",
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// An existing destination is replaced. Permissions and modification time
/// follow the source.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::GenericError(format!("{} does not exist", from.display())));
    }
    if !from.is_file() {
        return Err(Error::GenericError(format!("{} is not a file", from.display())));
    }
    let from = from.to_path_buf();
    let to = to.to_path_buf();
    tokio::task::spawn_blocking(move || copy_file_blocking(&from, &to))
        .await
        .map_err(|e| Error::GenericError(format!("file copy task panicked: {e}")))?
}

/// Recursively copies a directory into another one, merging with whatever
/// is already there.
///
/// Files for which `skip` returns `true` are left out. Symlinks are followed
/// and copied as regular files.
pub async fn copy_tree<F>(from: &Path, to: &Path, skip: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool + Send + 'static,
{
    if !from.is_dir() {
        return Err(Error::GenericError(format!(
            "{} is not a directory",
            from.display()
        )));
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let mut copied = Vec::new();
        std::fs::create_dir_all(&to).fs_context("creating directory", &to)?;

        for entry in walkdir::WalkDir::new(&from).follow_links(true) {
            let entry = entry?;
            let rel_path = entry.path().strip_prefix(&from)?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
            } else if !skip(entry.path()) {
                copy_file_blocking(entry.path(), &dest_path)?;
                copied.push(dest_path);
            }
        }

        Ok(copied)
    })
    .await
    .map_err(|e| Error::GenericError(format!("directory copy task panicked: {e}")))?
}

/// Copies every file matching `pattern` (relative to `from`) flat into `to`.
///
/// Directories and names without an extension dot are ignored.
pub async fn copy_glob(from: &Path, pattern: &str, to: &Path) -> Result<Vec<PathBuf>> {
    let full = from.join(pattern);
    let mut copied = Vec::new();

    for path in glob::glob(&full.to_string_lossy())?.flatten() {
        let Some(name) = path.file_name() else {
            continue;
        };
        if path.is_dir() || !name.to_string_lossy().contains('.') {
            continue;
        }
        let dest = to.join(name);
        copy_file(&path, &dest).await?;
        copied.push(dest);
    }

    Ok(copied)
}

/// Lists paths in `dir` matching a glob `pattern`, sorted.
pub fn glob_in(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = dir.join(pattern);
    let mut found: Vec<PathBuf> = glob::glob(&full.to_string_lossy())?.flatten().collect();
    found.sort();
    Ok(found)
}

fn copy_file_blocking(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).fs_context("creating directory", parent)?;
    }
    if to.exists() {
        std::fs::remove_file(to).fs_context("replacing file", to)?;
    }
    std::fs::copy(from, to).fs_context("copying file", from)?;

    let modified = std::fs::metadata(from)
        .and_then(|m| m.modified())
        .fs_context("reading file times", from)?;
    std::fs::File::options()
        .write(true)
        .open(to)
        .and_then(|f| f.set_modified(modified))
        .fs_context("setting file times", to)?;
    Ok(())
}
