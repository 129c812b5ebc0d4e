//! Zip archives of install directories.

use crate::bundler::{Result, error::ErrorExt};
use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Zips the contents of `dir` into `archive` with deflate compression.
///
/// Entry names are relative to `dir` with `/` separators. Returns the
/// archive path.
pub async fn zip_dir(dir: &Path, archive: &Path) -> Result<PathBuf> {
    let dir = dir.to_path_buf();
    let archive = archive.to_path_buf();
    tokio::task::spawn_blocking(move || zip_dir_blocking(&dir, &archive))
        .await
        .map_err(|e| crate::bundler::Error::GenericError(format!("zip task panicked: {e}")))?
}

fn zip_dir_blocking(dir: &Path, archive: &Path) -> Result<PathBuf> {
    if let Some(parent) = archive.parent() {
        std::fs::create_dir_all(parent).fs_context("creating archive directory", parent)?;
    }
    let file = File::create(archive).fs_context("creating archive", archive)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let rel = entry.path().strip_prefix(dir)?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut src = File::open(entry.path()).fs_context("opening file", entry.path())?;
            io::copy(&mut src, &mut zip).fs_context("writing archive entry", entry.path())?;
        }
    }

    zip.finish()?;
    Ok(archive.to_path_buf())
}

/// Unpacks `archive` into `dest`.
pub async fn unzip(archive: &Path, dest: &Path) -> Result<()> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let file = File::open(&archive).fs_context("opening archive", &archive)?;
        let mut zip = zip::ZipArchive::new(io::BufReader::new(file))?;
        zip.extract(&dest)?;
        Ok(())
    })
    .await
    .map_err(|e| crate::bundler::Error::GenericError(format!("unzip task panicked: {e}")))?
}
