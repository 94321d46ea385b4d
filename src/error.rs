//! Custom error types for flet-storage
//!
//! Every facade operation reports failures through [`StorageError`], defined
//! with thiserror. Variants map one-to-one onto the kinds of failure a caller
//! may want to branch on; free-form context lives in the message fields.

use thiserror::Error;

/// The main error type for storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Root directories could not be determined
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors (permissions, full disk, ...)
    #[error("I/O error: {0}")]
    Io(String),

    /// A file or folder that should exist does not
    #[error("{entry_type} not found: {path}")]
    NotFound {
        entry_type: &'static str,
        path: String,
    },

    /// Refused to overwrite an existing file
    #[error("File already exists: {0}")]
    AlreadyExists(String),

    /// A file was expected and a folder was found, or the other way around
    #[error("Expected a {expected}: {path}")]
    WrongEntryType {
        expected: &'static str,
        path: String,
    },

    /// Relative path would leave its storage root
    #[error("Unsafe path rejected: {0}")]
    PathTraversal(String),

    /// Authentication failed: wrong key, corrupted data or not encrypted at all
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Bytes on disk could not be interpreted as requested
    #[error("Malformed data: {0}")]
    MalformedData(String),

    /// The cipher refused to encrypt
    #[error("Encryption error: {0}")]
    Encryption(String),
}

impl StorageError {
    /// Create a "not found" error for files
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            entry_type: "File",
            path: path.into(),
        }
    }

    /// Create a "not found" error for folders
    pub fn folder_not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            entry_type: "Folder",
            path: path.into(),
        }
    }

    /// Create an error for a path that is a folder where a file was expected
    pub fn not_a_file(path: impl Into<String>) -> Self {
        Self::WrongEntryType {
            expected: "file",
            path: path.into(),
        }
    }

    /// Create an error for a path that is a file where a folder was expected
    pub fn not_a_folder(path: impl Into<String>) -> Self {
        Self::WrongEntryType {
            expected: "folder",
            path: path.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an "already exists" error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    /// Check if this is a rejected path
    pub fn is_path_traversal(&self) -> bool {
        matches!(self, Self::PathTraversal(_))
    }

    /// Check if this is a decryption failure
    pub fn is_decryption_failed(&self) -> bool {
        matches!(self, Self::DecryptionFailed(_))
    }

    /// Check if this is a malformed data error
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedData(_))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedData(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
