//! Paths the facade keeps for itself
//!
//! The key file and the two root directories are off limits to the file API
//! even when one root is nested inside the other.

use std::path::{Path, PathBuf};

use crate::config::{StoragePaths, StorageRoot};
use crate::crypto::KEY_FILE_NAME;
use crate::error::{StorageError, StorageResult};

/// Canonical locations of the roots and the key file
#[derive(Debug, Clone)]
pub(crate) struct Reserved {
    roots: [PathBuf; 2],
    key_file: PathBuf,
}

impl Reserved {
    /// Resolve the reserved locations; both roots must already exist
    pub fn resolve(paths: &StoragePaths) -> StorageResult<Self> {
        let data = canonical(paths.root_dir(StorageRoot::Persistent))?;
        let temp = canonical(paths.root_dir(StorageRoot::Temporary))?;
        let key_file = temp.join(KEY_FILE_NAME);
        Ok(Self {
            roots: [data, temp],
            key_file,
        })
    }

    /// Whether a resolved path is the key file
    pub fn is_key_file(&self, resolved: &Path) -> bool {
        resolved == self.key_file
    }

    /// Whether an entry met while walking or clearing must be left alone:
    /// the key file, or another root nested below the one being walked
    pub fn is_reserved(&self, path: &Path) -> bool {
        self.is_key_file(path) || self.roots.iter().any(|root| root == path)
    }

    /// Whether removing `dir` would take a root with it
    pub fn shelters_root(&self, dir: &Path) -> bool {
        self.roots.iter().any(|root| root.starts_with(dir))
    }
}

/// Canonical form of an existing directory
pub(crate) fn canonical(dir: &Path) -> StorageResult<PathBuf> {
    dir.canonicalize().map_err(|e| {
        StorageError::Io(format!("Failed to resolve {}: {}", dir.display(), e))
    })
}
