//! Storage layer for flet-storage
//!
//! [`FileStorage`] is the facade the rest of an application talks to. It owns
//! the resolved roots and the encryption key, validates every relative path,
//! and writes through the atomic publish in [`file_io`].

pub mod content;
pub mod file_io;
pub mod listing;
pub mod locks;
pub mod relative;
mod reserved;

pub use content::{Content, ContentKind};
pub use listing::{FileDetails, FileEntry, Listing, RootListing, SearchMatch};
pub use relative::RelativePath;

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{RootScope, StorageOptions, StoragePaths, StorageRoot};
use crate::crypto::{self, EncryptionKey};
use crate::error::{StorageError, StorageResult};

use file_io::{is_partial_file, publish_bytes, read_bytes, Publish};
use listing::{walk, NameMatcher, WalkOptions};
use locks::PathLocks;
use reserved::{canonical, Reserved};

/// Options for [`FileStorage::save_file`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    pub root: StorageRoot,
    pub encrypt: bool,
    pub overwrite: bool,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(mut self, root: StorageRoot) -> Self {
        self.root = root;
        self
    }

    pub fn encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Options for [`FileStorage::read_file`]
///
/// Decryption is on by default; plain files need `decrypt(false)`.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub root: StorageRoot,
    pub decrypt: bool,
    /// Expected kind; `None` detects it from the name and bytes
    pub kind: Option<ContentKind>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            root: StorageRoot::Persistent,
            decrypt: true,
            kind: None,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(mut self, root: StorageRoot) -> Self {
        self.root = root;
        self
    }

    pub fn decrypt(mut self, decrypt: bool) -> Self {
        self.decrypt = decrypt;
        self
    }

    pub fn kind(mut self, kind: ContentKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Options for [`FileStorage::edit_file`] and [`FileStorage::update_file`]
///
/// `encrypt` applies to both the read and the write back.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditOptions {
    pub root: StorageRoot,
    pub encrypt: bool,
}

impl EditOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(mut self, root: StorageRoot) -> Self {
        self.root = root;
        self
    }

    pub fn encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }
}

/// What [`FileStorage::edit_file`] does with the new content
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Overwrite the file with this content
    Replace(Content),
    /// Append to the current content (see [`Content::append`])
    Append(Content),
}

/// File storage facade over a persistent and a temporary root
#[derive(Debug)]
pub struct FileStorage {
    paths: StoragePaths,
    options: StorageOptions,
    key: EncryptionKey,
    locks: PathLocks,
    reserved: Reserved,
}

impl FileStorage {
    /// Open storage over `paths`, loading or creating the key file
    pub fn open(paths: StoragePaths, options: StorageOptions) -> StorageResult<Self> {
        paths.ensure_directories()?;
        let key = crypto::ensure_key(paths.temp_dir())?;
        Self::with_key(paths, options, key)
    }

    /// Open storage using the roots from the environment and default options
    pub fn from_env() -> StorageResult<Self> {
        Self::open(StoragePaths::from_env()?, StorageOptions::default())
    }

    /// Open storage with an explicit key; nothing is read from the key file
    pub fn with_key(
        paths: StoragePaths,
        options: StorageOptions,
        key: EncryptionKey,
    ) -> StorageResult<Self> {
        paths.ensure_directories()?;
        let reserved = Reserved::resolve(&paths)?;
        tracing::debug!(
            data = %paths.data_dir().display(),
            temp = %paths.temp_dir().display(),
            "Opened file storage"
        );
        Ok(Self {
            paths,
            options,
            key,
            locks: PathLocks::new(),
            reserved,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Get the facade options
    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    /// Directory of a root, created if it went missing
    pub fn resolve_root(&self, root: StorageRoot) -> StorageResult<PathBuf> {
        self.paths.ensure_root(root).map(Path::to_path_buf)
    }

    /// Save content under `name`
    ///
    /// Fails with `AlreadyExists` when the file exists and `overwrite` is off,
    /// leaving the existing file untouched.
    pub fn save_file(
        &self,
        name: &str,
        content: impl Into<Content>,
        options: SaveOptions,
    ) -> StorageResult<()> {
        let content = content.into();
        let (relative, path) = self.locate(name, options.root)?;

        if path.is_dir() {
            return Err(StorageError::not_a_file(relative.to_string()));
        }

        let bytes = self.encode(&content, options.encrypt)?;
        self.locks
            .with_lock(&path, || {
                publish_bytes(&path, &bytes, Publish::from_overwrite(options.overwrite))
            })
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => StorageError::AlreadyExists(relative.to_string()),
                other => other,
            })?;

        tracing::debug!(
            root = %options.root,
            path = %relative,
            kind = %content.kind(),
            encrypt = options.encrypt,
            "Saved file"
        );
        Ok(())
    }

    /// Read the file at `name`
    pub fn read_file(&self, name: &str, options: ReadOptions) -> StorageResult<Content> {
        let (relative, path) = self.locate(name, options.root)?;
        let bytes = self.read_existing(&relative, &path)?;
        let content = self.decode(&relative, bytes, options.decrypt, options.kind)?;

        tracing::debug!(
            root = %options.root,
            path = %relative,
            kind = %content.kind(),
            decrypt = options.decrypt,
            "Read file"
        );
        Ok(content)
    }

    /// Replace or append to an existing file
    ///
    /// Appended content is read back as its own kind: appending text reads
    /// the file as text, appending JSON parses it as JSON.
    pub fn edit_file(&self, name: &str, edit: Edit, options: EditOptions) -> StorageResult<()> {
        match edit {
            Edit::Replace(content) => {
                let (relative, path) = self.locate(name, options.root)?;
                let bytes = self.encode(&content, options.encrypt)?;
                self.locks.with_lock(&path, || {
                    self.require_file(&relative, &path)?;
                    publish_bytes(&path, &bytes, Publish::Replace)
                })?;
                tracing::debug!(root = %options.root, path = %relative, "Replaced file content");
                Ok(())
            }
            Edit::Append(addition) => {
                let kind = addition.kind();
                let indent = self.options.json_indent;
                self.update_file(name, Some(kind), options, |current| {
                    current.append(addition, indent)
                })
            }
        }
    }

    /// Read, transform and write back a file under its path lock
    ///
    /// `kind` selects how the current bytes are decoded, as in
    /// [`ReadOptions::kind`].
    pub fn update_file<F>(
        &self,
        name: &str,
        kind: Option<ContentKind>,
        options: EditOptions,
        transform: F,
    ) -> StorageResult<()>
    where
        F: FnOnce(Content) -> StorageResult<Content>,
    {
        let (relative, path) = self.locate(name, options.root)?;

        self.locks.with_lock(&path, || {
            let bytes = self.read_existing(&relative, &path)?;
            let current = self.decode(&relative, bytes, options.encrypt, kind)?;
            let updated = transform(current)?;
            let bytes = self.encode(&updated, options.encrypt)?;
            publish_bytes(&path, &bytes, Publish::Replace)
        })?;

        tracing::debug!(root = %options.root, path = %relative, "Updated file");
        Ok(())
    }

    /// Delete a file; `NotFound` if it does not exist
    pub fn delete_file(&self, name: &str, root: StorageRoot) -> StorageResult<()> {
        let (relative, path) = self.locate(name, root)?;

        self.locks.with_lock(&path, || {
            self.require_file(&relative, &path)?;
            fs::remove_file(&path).map_err(|e| {
                StorageError::Io(format!("Failed to delete {}: {}", relative, e))
            })
        })?;

        tracing::debug!(root = %root, path = %relative, "Deleted file");
        Ok(())
    }

    /// Delete a folder and everything below it
    ///
    /// Symbolic links inside the folder are removed, not followed. A symbolic
    /// link passed as the folder itself is rejected as not a folder. A folder
    /// holding the other storage root is refused.
    pub fn delete_folder(&self, name: &str, root: StorageRoot) -> StorageResult<()> {
        let (relative, path, resolved) = self.resolve(name, root)?;

        match fs::symlink_metadata(&path) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(StorageError::not_a_folder(relative.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::folder_not_found(relative.to_string()))
            }
            Err(e) => {
                return Err(StorageError::Io(format!(
                    "Failed to stat {}: {}",
                    relative, e
                )))
            }
        }

        if self.reserved.shelters_root(&resolved) {
            return Err(StorageError::PathTraversal(format!(
                "{} contains a storage root",
                relative
            )));
        }

        fs::remove_dir_all(&path).map_err(|e| {
            StorageError::Io(format!("Failed to delete folder {}: {}", relative, e))
        })?;

        tracing::debug!(root = %root, path = %relative, "Deleted folder");
        Ok(())
    }

    /// Snapshot the files under each root in scope
    ///
    /// Each root reports [`Listing::Empty`] when it holds no files.
    pub fn list_files(&self, scope: RootScope, show_details: bool) -> StorageResult<Vec<RootListing>> {
        let walk_options = WalkOptions {
            recursive: true,
            details: show_details,
        };

        scope
            .roots()
            .iter()
            .map(|&root| {
                let dir = self.paths.ensure_root(root)?;
                let entries = walk(dir, walk_options, &self.reserved)?;
                Ok(RootListing {
                    root,
                    listing: Listing::from_entries(entries),
                })
            })
            .collect()
    }

    /// Find files whose name contains `query`
    pub fn search_files(
        &self,
        query: &str,
        scope: RootScope,
        recursive: bool,
    ) -> StorageResult<Vec<SearchMatch>> {
        let mut results = self.search_many([query], scope, recursive)?;
        Ok(results.remove(query).unwrap_or_default())
    }

    /// Run several name queries in one walk
    ///
    /// Every query appears in the result, with an empty vector when nothing
    /// matched it.
    pub fn search_many<I, S>(
        &self,
        queries: I,
        scope: RootScope,
        recursive: bool,
    ) -> StorageResult<BTreeMap<String, Vec<SearchMatch>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let case_sensitive = self.options.case_sensitive_search;
        let matchers: Vec<(String, NameMatcher)> = queries
            .into_iter()
            .map(|q| {
                let q = q.as_ref();
                (q.to_string(), NameMatcher::new(q, case_sensitive))
            })
            .collect();

        let mut results: BTreeMap<String, Vec<SearchMatch>> = matchers
            .iter()
            .map(|(query, _)| (query.clone(), Vec::new()))
            .collect();

        let walk_options = WalkOptions {
            recursive,
            details: false,
        };

        for &root in scope.roots() {
            let dir = self.paths.ensure_root(root)?;
            for entry in walk(dir, walk_options, &self.reserved)? {
                for (query, matcher) in &matchers {
                    if matcher.matches(entry.file_name()) {
                        if let Some(found) = results.get_mut(query) {
                            found.push(SearchMatch {
                                root,
                                path: entry.path.clone(),
                            });
                        }
                    }
                }
            }
        }

        Ok(results)
    }

    /// Whether anything exists at `name`
    ///
    /// Names that fail validation, resolve outside the root or point at the
    /// key file report `false`. Nothing is created on disk.
    pub fn file_exists(&self, name: &str, root: StorageRoot) -> bool {
        let Ok(relative) = RelativePath::parse(name) else {
            return false;
        };
        let root_dir = self.paths.root_dir(root);
        let path = relative.to_path(root_dir);

        relative
            .ensure_within(root_dir, &path)
            .and_then(|resolved| self.check_reserved(&relative, &resolved))
            .is_ok()
            && fs::symlink_metadata(&path).is_ok()
    }

    /// Remove everything under a root but keep the root itself
    ///
    /// The key file survives clearing the temporary root, and a root nested
    /// inside the one being cleared is left in place.
    pub fn clear_storage(&self, root: StorageRoot) -> StorageResult<()> {
        let dir = canonical(self.paths.ensure_root(root)?)?;
        let removed = clear_dir(&dir, &self.reserved)?;

        tracing::info!(root = %root, removed, "Cleared storage");
        Ok(())
    }

    /// Validate `name` and resolve it under `root`
    fn locate(&self, name: &str, root: StorageRoot) -> StorageResult<(RelativePath, PathBuf)> {
        let (relative, path, _) = self.resolve(name, root)?;
        Ok((relative, path))
    }

    /// [`Self::locate`] plus the symlink-resolved location
    fn resolve(
        &self,
        name: &str,
        root: StorageRoot,
    ) -> StorageResult<(RelativePath, PathBuf, PathBuf)> {
        let relative = RelativePath::parse(name)?;
        let root_dir = self.paths.ensure_root(root)?;
        let path = relative.to_path(root_dir);
        let resolved = relative.ensure_within(root_dir, &path)?;
        self.check_reserved(&relative, &resolved)?;
        Ok((relative, path, resolved))
    }

    /// Refuse the key file and names shaped like in-flight writes
    fn check_reserved(&self, relative: &RelativePath, resolved: &Path) -> StorageResult<()> {
        if relative
            .segments()
            .any(|segment| is_partial_file(OsStr::new(segment)))
        {
            return Err(StorageError::PathTraversal(format!(
                "{} is reserved for in-flight writes",
                relative
            )));
        }
        if self.reserved.is_key_file(resolved) {
            return Err(StorageError::PathTraversal(format!(
                "{} is reserved for the storage key",
                relative
            )));
        }
        Ok(())
    }

    fn require_file(&self, relative: &RelativePath, path: &Path) -> StorageResult<()> {
        match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => Ok(()),
            Ok(_) => Err(StorageError::not_a_file(relative.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::file_not_found(relative.to_string()))
            }
            Err(e) => Err(StorageError::Io(format!("Failed to stat {}: {}", relative, e))),
        }
    }

    fn read_existing(&self, relative: &RelativePath, path: &Path) -> StorageResult<Vec<u8>> {
        self.require_file(relative, path)?;
        read_bytes(path).map_err(|e| match e {
            StorageError::NotFound { .. } => StorageError::file_not_found(relative.to_string()),
            other => other,
        })
    }

    fn encode(&self, content: &Content, encrypt: bool) -> StorageResult<Vec<u8>> {
        let bytes = content.to_bytes(self.options.json_indent)?;
        if encrypt {
            crypto::encrypt(&bytes, &self.key)
        } else {
            Ok(bytes)
        }
    }

    fn decode(
        &self,
        relative: &RelativePath,
        bytes: Vec<u8>,
        decrypt: bool,
        kind: Option<ContentKind>,
    ) -> StorageResult<Content> {
        let bytes = if decrypt {
            crypto::decrypt(&bytes, &self.key).map_err(|e| {
                tracing::debug!(path = %relative, error = %e, "Decryption failed");
                match e {
                    StorageError::DecryptionFailed(reason) => {
                        StorageError::DecryptionFailed(format!("{}: {}", relative, reason))
                    }
                    other => other,
                }
            })?
        } else {
            bytes
        };

        match kind {
            Some(kind) => Content::from_bytes(bytes, kind),
            None => Content::detect(relative.file_name(), bytes),
        }
    }
}

/// Remove the contents of `dir`, stepping around reserved entries
fn clear_dir(dir: &Path, reserved: &Reserved) -> StorageResult<usize> {
    let read_dir = fs::read_dir(dir).map_err(|e| {
        StorageError::Io(format!("Failed to read directory {}: {}", dir.display(), e))
    })?;

    let mut removed = 0usize;
    for entry in read_dir {
        let entry = entry.map_err(|e| {
            StorageError::Io(format!("Failed to read directory entry: {}", e))
        })?;
        let path = entry.path();
        if reserved.is_reserved(&path) || is_partial_file(&entry.file_name()) {
            continue;
        }

        let file_type = entry.file_type().map_err(|e| {
            StorageError::Io(format!("Failed to stat {}: {}", path.display(), e))
        })?;

        let result = if file_type.is_dir() {
            if reserved.shelters_root(&path) {
                removed += clear_dir(&path, reserved)?;
                continue;
            }
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match result {
            Ok(()) => removed += 1,
            // Already gone, someone else won
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StorageError::Io(format!(
                    "Failed to remove {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    Ok(removed)
}
