//! Validated relative paths
//!
//! Every name handed to the facade goes through [`RelativePath::parse`], which
//! keeps paths confined to their storage root.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{StorageError, StorageResult};

/// A path relative to a storage root that cannot escape it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelativePath {
    parts: Vec<String>,
}

impl RelativePath {
    /// Validate a caller-supplied name
    ///
    /// Accepts `/` (and `\` on Windows) as separators and ignores `.` and
    /// empty segments. Rejects absolute paths, drive prefixes and any `..`
    /// segment, even one that would stay inside the root.
    pub fn parse(name: &str) -> StorageResult<Self> {
        let mut parts = Vec::new();

        for component in Path::new(name).components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        StorageError::PathTraversal(format!("non UTF-8 path: {}", name))
                    })?;
                    parts.push(part.to_string());
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(StorageError::PathTraversal(format!(
                        "parent directory reference in {}",
                        name
                    )))
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(StorageError::PathTraversal(format!(
                        "absolute path {}",
                        name
                    )))
                }
            }
        }

        if parts.is_empty() {
            return Err(StorageError::PathTraversal(format!(
                "empty path {:?}",
                name
            )));
        }

        Ok(Self { parts })
    }

    /// Last path segment
    pub fn file_name(&self) -> &str {
        // parse() guarantees at least one segment
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    /// Join onto a root directory
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.parts);
        path
    }

    /// Segments of the path, outermost first
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(String::as_str)
    }

    /// Resolve `path` through symlinks and check it stays inside `root`
    ///
    /// An existing entry is resolved in full, so a link at the leaf must land
    /// inside the root too; dangling links are rejected. A missing entry is
    /// resolved through its nearest existing ancestor. Returns the resolved
    /// path.
    pub fn ensure_within(&self, root: &Path, path: &Path) -> StorageResult<PathBuf> {
        let root = root.canonicalize().map_err(|e| {
            StorageError::Io(format!("Failed to resolve root {}: {}", root.display(), e))
        })?;
        let escape = || StorageError::PathTraversal(format!("{} resolves outside its root", self));

        if fs::symlink_metadata(path).is_ok() {
            let resolved = path.canonicalize().map_err(|_| escape())?;
            return if resolved.starts_with(&root) {
                Ok(resolved)
            } else {
                Err(escape())
            };
        }

        let mut tail = Vec::new();
        let mut current = path;
        loop {
            match (current.parent(), current.file_name()) {
                (Some(parent), Some(name)) => {
                    tail.push(name);
                    current = parent;
                }
                _ => return Err(escape()),
            }

            if let Ok(mut resolved) = current.canonicalize() {
                if !resolved.starts_with(&root) {
                    return Err(escape());
                }
                resolved.extend(tail.iter().rev());
                return Ok(resolved);
            }
        }
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("/"))
    }
}

/// Render a path below `root` as a `/`-separated relative string
pub fn relative_display(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
