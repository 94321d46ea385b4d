//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't leave truncated files behind.
//! Content is written to a uniquely named sibling file, synced, then moved
//! onto the target in one step.

use std::ffi::OsStr;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Suffix of in-flight temp files
pub const PARTIAL_SUFFIX: &str = ".partial";

/// How a finished temp file replaces its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    /// Replace the target if it exists
    Replace,
    /// Fail with `AlreadyExists` if the target exists
    NoClobber,
}

impl Publish {
    /// Map an overwrite flag onto a publish mode
    pub fn from_overwrite(overwrite: bool) -> Self {
        if overwrite {
            Self::Replace
        } else {
            Self::NoClobber
        }
    }
}

/// Whether a file name has the exact shape of an in-flight write,
/// `.<target name>.<32 hex digits>.partial`
pub fn is_partial_file(name: &OsStr) -> bool {
    let Some(name) = name.to_str() else {
        return false;
    };
    let Some(stem) = name
        .strip_prefix('.')
        .and_then(|n| n.strip_suffix(PARTIAL_SUFFIX))
    else {
        return false;
    };
    match stem.rsplit_once('.') {
        Some((target, id)) => {
            !target.is_empty()
                && id.len() == 32
                && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        }
        None => false,
    }
}

/// Sibling temp path for a target (same directory, so rename stays atomic)
fn partial_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(
        ".{}.{}{}",
        file_name,
        Uuid::new_v4().simple(),
        PARTIAL_SUFFIX
    ))
}

/// Who may read a published file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Platform defaults (umask on Unix)
    Shared,
    /// Owner read/write only on Unix, from the moment the file is created
    Private,
}

/// Write bytes to a file atomically (write to temp, then rename)
///
/// Either the whole content lands at `path` or the target is left as it was.
/// Parent directories are created as needed.
pub fn publish_bytes(path: &Path, bytes: &[u8], mode: Publish) -> StorageResult<()> {
    publish_bytes_with(path, bytes, mode, Access::Shared)
}

/// [`publish_bytes`] with explicit access for the new file
pub fn publish_bytes_with(
    path: &Path,
    bytes: &[u8],
    mode: Publish,
    access: Access,
) -> StorageResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            StorageError::Io(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    if mode == Publish::NoClobber && path.exists() {
        return Err(StorageError::AlreadyExists(path.display().to_string()));
    }

    let temp_path = partial_path(path);

    if let Err(e) = write_synced(&temp_path, bytes, access) {
        discard(&temp_path);
        return Err(StorageError::Io(format!(
            "Failed to write {}: {}",
            temp_path.display(),
            e
        )));
    }

    let result = match mode {
        Publish::Replace => fs::rename(&temp_path, path).map_err(|e| {
            StorageError::Io(format!("Failed to rename temp file onto {}: {}", path.display(), e))
        }),
        Publish::NoClobber => link_no_clobber(&temp_path, path),
    };

    // After a successful rename the temp file is gone; otherwise clean it up
    if result.is_err() || mode == Publish::NoClobber {
        discard(&temp_path);
    }

    result
}

/// Read a whole file, mapping a missing file to `NotFound`
pub fn read_bytes(path: &Path) -> StorageResult<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StorageError::file_not_found(path.display().to_string()),
        _ => StorageError::Io(format!("Failed to read {}: {}", path.display(), e)),
    })
}

fn write_synced(path: &Path, bytes: &[u8], access: Access) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    if access == Access::Private {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    #[cfg(not(unix))]
    let _ = access;

    let file = options.open(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;

    // Sync to disk before publishing
    writer.get_ref().sync_all()
}

/// Publish `temp` at `dest` only if nothing is there yet
///
/// A hard link fails atomically when the destination exists. Filesystems
/// without hard links fall back to check-then-rename.
fn link_no_clobber(temp: &Path, dest: &Path) -> StorageResult<()> {
    match fs::hard_link(temp, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            Err(StorageError::AlreadyExists(dest.display().to_string()))
        }
        Err(link_err) => {
            tracing::debug!(error = %link_err, "Hard link unavailable, falling back to rename");
            if dest.exists() {
                return Err(StorageError::AlreadyExists(dest.display().to_string()));
            }
            fs::rename(temp, dest).map_err(|e| {
                StorageError::Io(format!("Failed to rename temp file onto {}: {}", dest.display(), e))
            })
        }
    }
}

fn discard(temp: &Path) {
    if let Err(e) = fs::remove_file(temp) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %temp.display(), error = %e, "Failed to remove temp file");
        }
    }
}
