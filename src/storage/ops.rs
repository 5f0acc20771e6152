//! Filesystem operations behind GET, PUT and DELETE
//!
//! Every operation stats before acting and reports failures as [`FsError`].

use super::listing::{self, ListingEntry};
use super::FsError;
use hyper::body::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

/// Suffix source for temporary upload files
static UPLOAD_SEQ: AtomicU64 = AtomicU64::new(0);

/// Result of a GET against a resolved path
#[derive(Debug)]
pub enum ReadOutcome {
    Directory(Vec<ListingEntry>),
    File {
        file: fs::File,
        path: PathBuf,
        len: u64,
    },
}

/// Stat `path`, following symlinks
pub async fn stat(path: &Path) -> Result<std::fs::Metadata, FsError> {
    fs::metadata(path)
        .await
        .map_err(|e| FsError::not_found(path, e))
}

/// Open a file for streaming or enumerate a directory
pub async fn read_or_list(path: &Path) -> Result<ReadOutcome, FsError> {
    let meta = stat(path).await?;

    if meta.is_dir() {
        let entries = listing::read_entries(path).await?;
        return Ok(ReadOutcome::Directory(entries));
    }

    let file = fs::File::open(path)
        .await
        .map_err(|e| FsError::io("open", path, e))?;
    Ok(ReadOutcome::File {
        file,
        path: path.to_path_buf(),
        len: meta.len(),
    })
}

/// Write `body` to `path`, creating missing parent directories
///
/// The bytes land in a sibling temporary file that is then renamed over
/// the target, so concurrent writers never interleave. An existing
/// directory at `path` is refused before anything is created.
pub async fn write_file(path: &Path, body: Bytes) -> Result<(), FsError> {
    if fs::metadata(path).await.is_ok_and(|meta| meta.is_dir()) {
        return Err(is_a_directory("open", path));
    }

    let (Some(parent), Some(_)) = (path.parent(), path.file_name()) else {
        return Err(FsError::io(
            "open",
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "not a file path"),
        ));
    };

    fs::create_dir_all(parent)
        .await
        .map_err(|e| FsError::io("mkdir", parent, e))?;

    // fixed-length name: the target may already sit at NAME_MAX
    let tmp = parent.join(format!(
        ".upload-{}-{}",
        std::process::id(),
        UPLOAD_SEQ.fetch_add(1, Ordering::Relaxed)
    ));

    if let Err(e) = fs::write(&tmp, &body).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(FsError::io("write", path, e));
    }

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(FsError::io("rename", path, e));
    }

    Ok(())
}

pub fn is_a_directory(op: &'static str, path: &Path) -> FsError {
    FsError::io(
        op,
        path,
        io::Error::new(io::ErrorKind::Other, "illegal operation on a directory"),
    )
}

/// Remove a single file; directories are refused
pub async fn delete_file(path: &Path) -> Result<(), FsError> {
    let meta = stat(path).await?;

    if meta.is_dir() {
        return Err(FsError::IsDirectory {
            path: path.to_path_buf(),
        });
    }

    fs::remove_file(path)
        .await
        .map_err(|e| FsError::io("unlink", path, e))
}
