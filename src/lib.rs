//! flet-storage - File storage for apps with a persistent and a scratch root
//!
//! This library saves, reads, edits, lists and searches files under two
//! storage roots, with optional AES-256-GCM encryption at rest.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Root resolution and facade options
//! - `error`: Custom error types
//! - `crypto`: Key provisioning and the encrypted file envelope
//! - `storage`: The [`FileStorage`] facade and its building blocks
//! - `display`: Plain-text summaries of listings and searches
//!
//! # Example
//!
//! ```rust,no_run
//! use flet_storage::{Content, FileStorage, ReadOptions, SaveOptions};
//!
//! let storage = FileStorage::from_env()?;
//! storage.save_file("hello.txt", "Hello!", SaveOptions::new().overwrite(true))?;
//! let content = storage.read_file("hello.txt", ReadOptions::new().decrypt(false))?;
//! assert_eq!(content, Content::Text("Hello!".into()));
//! # Ok::<(), flet_storage::StorageError>(())
//! ```
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod storage;

pub use config::{RootScope, StorageOptions, StoragePaths, StorageRoot};
pub use crypto::EncryptionKey;
pub use error::{StorageError, StorageResult};
pub use storage::{
    Content, ContentKind, Edit, EditOptions, FileStorage, Listing, ReadOptions, RootListing,
    SaveOptions, SearchMatch,
};
