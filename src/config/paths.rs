//! Path management for flet-storage
//!
//! Resolves the two storage roots the facade works under.
//!
//! ## Path Resolution Order
//!
//! Persistent root:
//! 1. `FLET_APP_STORAGE_DATA` environment variable (if set and non-empty)
//! 2. Platform data directory (`~/.local/share/flet-storage` on Linux)
//! 3. `./storage` under the working directory
//!
//! Temporary root:
//! 1. `FLET_APP_STORAGE_TEMP` environment variable (if set and non-empty)
//! 2. Platform cache directory (`~/.cache/flet-storage` on Linux)
//! 3. `temp/` inside the persistent root

use std::fmt;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Environment variable overriding the persistent root
pub const DATA_DIR_ENV: &str = "FLET_APP_STORAGE_DATA";

/// Environment variable overriding the temporary root
pub const TEMP_DIR_ENV: &str = "FLET_APP_STORAGE_TEMP";

const APPLICATION: &str = "flet-storage";

/// One of the two base directories files live under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageRoot {
    /// Application data that survives restarts
    #[default]
    Persistent,
    /// Scratch space; also holds the key file
    Temporary,
}

impl StorageRoot {
    /// Human-readable label used in summaries
    pub fn label(&self) -> &'static str {
        match self {
            Self::Persistent => "Data Storage",
            Self::Temporary => "Temp Storage",
        }
    }
}

impl fmt::Display for StorageRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistent => write!(f, "persistent"),
            Self::Temporary => write!(f, "temporary"),
        }
    }
}

/// Which roots a listing or search covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RootScope {
    #[default]
    Persistent,
    Temporary,
    Both,
}

impl RootScope {
    /// Roots in scope, persistent first
    pub fn roots(&self) -> &'static [StorageRoot] {
        match self {
            Self::Persistent => &[StorageRoot::Persistent],
            Self::Temporary => &[StorageRoot::Temporary],
            Self::Both => &[StorageRoot::Persistent, StorageRoot::Temporary],
        }
    }
}

impl From<StorageRoot> for RootScope {
    fn from(root: StorageRoot) -> Self {
        match root {
            StorageRoot::Persistent => Self::Persistent,
            StorageRoot::Temporary => Self::Temporary,
        }
    }
}

/// The resolved persistent and temporary directories
#[derive(Debug, Clone)]
pub struct StoragePaths {
    data_dir: PathBuf,
    temp_dir: PathBuf,
}

impl StoragePaths {
    /// Resolve both roots from the environment, falling back to defaults
    ///
    /// Nothing is created on disk here; see [`StoragePaths::ensure_root`].
    ///
    /// # Errors
    ///
    /// Returns an error if no environment override is set and the working
    /// directory cannot be determined either.
    pub fn from_env() -> StorageResult<Self> {
        let project = ProjectDirs::from("", "", APPLICATION);

        let data_dir = match env_dir(DATA_DIR_ENV) {
            Some(dir) => dir,
            None => match &project {
                Some(project) => project.data_dir().to_path_buf(),
                None => std::env::current_dir()
                    .map_err(|e| {
                        StorageError::Config(format!(
                            "Could not determine a data directory: {}",
                            e
                        ))
                    })?
                    .join("storage"),
            },
        };

        let temp_dir = match env_dir(TEMP_DIR_ENV) {
            Some(dir) => dir,
            None => match &project {
                Some(project) => project.cache_dir().to_path_buf(),
                None => data_dir.join("temp"),
            },
        };

        Ok(Self::with_dirs(data_dir, temp_dir))
    }

    /// Create StoragePaths with explicit directories (useful for testing)
    pub fn with_dirs(data_dir: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Get the persistent root
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the temporary root
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Get the directory for a root without touching the disk
    pub fn root_dir(&self, root: StorageRoot) -> &Path {
        match root {
            StorageRoot::Persistent => &self.data_dir,
            StorageRoot::Temporary => &self.temp_dir,
        }
    }

    /// Get the directory for a root, creating it if missing
    pub fn ensure_root(&self, root: StorageRoot) -> StorageResult<&Path> {
        let dir = self.root_dir(root);
        std::fs::create_dir_all(dir).map_err(|e| {
            StorageError::Io(format!(
                "Failed to create {} root {}: {}",
                root,
                dir.display(),
                e
            ))
        })?;
        Ok(dir)
    }

    /// Ensure both roots exist
    pub fn ensure_directories(&self) -> StorageResult<()> {
        self.ensure_root(StorageRoot::Persistent)?;
        self.ensure_root(StorageRoot::Temporary)?;
        Ok(())
    }
}

fn env_dir(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
