//! Directory snapshots for listing and search
//!
//! Walks a storage root and collects the files under it. Symbolic links are
//! reported as entries but never followed, so a walk cannot leave its root.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StorageRoot;
use crate::error::{StorageError, StorageResult};

use super::content::ContentKind;
use super::file_io::is_partial_file;
use super::relative::relative_display;
use super::reserved::{canonical, Reserved};

/// Size, kind and timestamp of a listed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDetails {
    /// Size in bytes
    pub size_bytes: u64,
    /// Kind guessed from the extension, if it says anything
    pub kind: Option<ContentKind>,
    /// Last modification time, when the platform reports one
    pub modified: Option<DateTime<Utc>>,
}

/// One file in a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to its root, `/`-separated
    pub path: String,
    /// Present when details were requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<FileDetails>,
}

impl FileEntry {
    /// Last path segment
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Files under one root, or the "no files" sentinel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "files", rename_all = "lowercase")]
pub enum Listing {
    Empty,
    Files(Vec<FileEntry>),
}

impl Listing {
    pub(crate) fn from_entries(entries: Vec<FileEntry>) -> Self {
        if entries.is_empty() {
            Self::Empty
        } else {
            Self::Files(entries)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Number of files listed
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Files(files) => files.len(),
        }
    }

    /// Listed files, empty for the sentinel
    pub fn files(&self) -> &[FileEntry] {
        match self {
            Self::Empty => &[],
            Self::Files(files) => files,
        }
    }

    /// Relative paths of the listed files
    pub fn paths(&self) -> Vec<&str> {
        self.files().iter().map(|f| f.path.as_str()).collect()
    }
}

/// Snapshot of one root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootListing {
    pub root: StorageRoot,
    pub listing: Listing,
}

/// A file whose name matched a search query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub root: StorageRoot,
    /// Path relative to its root, `/`-separated
    pub path: String,
}

/// Options for a directory walk
#[derive(Debug, Clone, Copy)]
pub(crate) struct WalkOptions {
    pub recursive: bool,
    pub details: bool,
}

/// Collect files under `root_dir`, sorted by relative path
///
/// The key file, a root nested below `root_dir` and in-flight writes are
/// skipped. A missing root yields an empty listing.
pub(crate) fn walk(
    root_dir: &Path,
    options: WalkOptions,
    reserved: &Reserved,
) -> StorageResult<Vec<FileEntry>> {
    let mut entries = Vec::new();
    if root_dir.is_dir() {
        let root_dir = canonical(root_dir)?;
        walk_dir(&root_dir, &root_dir, options, reserved, &mut entries)?;
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn walk_dir(
    root_dir: &Path,
    dir: &Path,
    options: WalkOptions,
    reserved: &Reserved,
    entries: &mut Vec<FileEntry>,
) -> StorageResult<()> {
    let read_dir = fs::read_dir(dir).map_err(|e| {
        StorageError::Io(format!("Failed to read directory {}: {}", dir.display(), e))
    })?;

    for entry in read_dir {
        let entry = entry.map_err(|e| {
            StorageError::Io(format!("Failed to read directory entry: {}", e))
        })?;

        let path = entry.path();
        if reserved.is_reserved(&path) || is_partial_file(&entry.file_name()) {
            continue;
        }

        // file_type() does not follow symlinks
        let file_type = entry.file_type().map_err(|e| {
            StorageError::Io(format!("Failed to stat {}: {}", path.display(), e))
        })?;

        if file_type.is_dir() {
            if options.recursive {
                walk_dir(root_dir, &path, options, reserved, entries)?;
            }
            continue;
        }

        let relative = relative_display(root_dir, &path);
        let details = if options.details {
            let metadata = entry.metadata().map_err(|e| {
                StorageError::Io(format!("Failed to stat {}: {}", path.display(), e))
            })?;
            Some(FileDetails {
                size_bytes: metadata.len(),
                kind: ContentKind::from_name(&relative),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            })
        } else {
            None
        };

        entries.push(FileEntry {
            path: relative,
            details,
        });
    }

    Ok(())
}

/// Substring matcher over file names honoring the case policy
#[derive(Debug, Clone)]
pub(crate) struct NameMatcher {
    needle: String,
    case_sensitive: bool,
}

impl NameMatcher {
    pub fn new(query: &str, case_sensitive: bool) -> Self {
        let needle = if case_sensitive {
            query.to_string()
        } else {
            query.to_lowercase()
        };
        Self {
            needle,
            case_sensitive,
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        if self.case_sensitive {
            file_name.contains(&self.needle)
        } else {
            file_name.to_lowercase().contains(&self.needle)
        }
    }
}
