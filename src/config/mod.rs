//! Configuration module for flet-storage
//!
//! This module provides:
//! - Storage root resolution from the environment
//! - Facade options (JSON formatting, search policy)

pub mod options;
pub mod paths;

pub use options::StorageOptions;
pub use paths::{RootScope, StoragePaths, StorageRoot};
