//! Facade options for flet-storage
//!
//! Tunables that change how content is written and how names are matched.
//! Serializable so a host application can keep them next to its own settings.

use serde::{Deserialize, Serialize};

/// Options for a [`FileStorage`](crate::storage::FileStorage) instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageOptions {
    /// Spaces per indentation level when writing JSON content
    #[serde(default = "default_json_indent")]
    pub json_indent: usize,

    /// Whether search queries must match file names case-sensitively
    #[serde(default)]
    pub case_sensitive_search: bool,
}

fn default_json_indent() -> usize {
    4
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            json_indent: default_json_indent(),
            case_sensitive_search: false,
        }
    }
}

impl StorageOptions {
    /// Set the JSON indentation width
    pub fn with_json_indent(mut self, indent: usize) -> Self {
        self.json_indent = indent;
        self
    }

    /// Set the search case policy
    pub fn with_case_sensitive_search(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive_search = case_sensitive;
        self
    }
}
