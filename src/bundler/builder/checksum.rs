//! Artifact size and SHA-256 calculation.
//!
//! Installers are single files; merged install directories that get
//! reported are hashed as a whole, path plus content per file, in sorted
//! order.

use crate::{
    bail,
    bundler::{Result, error::ErrorExt},
};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

const CHUNK: usize = 8192;

/// Size in bytes and hex SHA-256 of a file or directory tree.
pub async fn digest(path: &Path) -> Result<(u64, String)> {
    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading artifact metadata", path)?;

    if metadata.is_file() {
        let mut hasher = Sha256::new();
        let size = hash_file_into(path, &mut hasher).await?;
        Ok((size, format!("{:x}", hasher.finalize())))
    } else if metadata.is_dir() {
        digest_dir(path).await
    } else {
        bail!("{} is neither file nor directory", path.display())
    }
}

async fn digest_dir(dir: &Path) -> Result<(u64, String)> {
    let mut files: Vec<_> = walkdir::WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();

    let mut hasher = Sha256::new();
    let mut total = 0u64;
    for file in files {
        if let Ok(rel) = file.strip_prefix(dir) {
            hasher.update(rel.to_string_lossy().as_bytes());
        }
        total += hash_file_into(&file, &mut hasher).await?;
    }

    Ok((total, format!("{:x}", hasher.finalize())))
}

async fn hash_file_into(path: &Path, hasher: &mut Sha256) -> Result<u64> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut buffer = vec![0u8; CHUNK];
    let mut total = 0u64;

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        total += n as u64;
        hasher.update(&buffer[..n]);
    }

    Ok(total)
}
