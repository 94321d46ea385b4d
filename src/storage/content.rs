//! Content kinds and their byte encodings
//!
//! Callers say what they are storing with [`Content`] and what they expect
//! back with [`ContentKind`]; nothing is inferred from Rust types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::error::{StorageError, StorageResult};

/// Extensions treated as binary when guessing a kind from a file name
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "gif", "webp", "ico", "mp3", "wav", "ogg", "flac", "mp4", "pdf",
    "zip", "gz", "bin",
];

/// The three interpretations a stored file can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Json,
    Binary,
}

impl ContentKind {
    /// Guess a kind from a file name's extension alone
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        if ext == "json" {
            Some(Self::Json)
        } else if BINARY_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Binary)
        } else {
            None
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// A value to store or a value read back
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Json(Value),
    Binary(Vec<u8>),
}

impl Content {
    /// Build JSON content from any serializable value
    pub fn json<T: Serialize>(value: &T) -> StorageResult<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// The kind tag of this content
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Text(_) => ContentKind::Text,
            Self::Json(_) => ContentKind::Json,
            Self::Binary(_) => ContentKind::Binary,
        }
    }

    /// Serialize to the bytes written on disk
    ///
    /// JSON is pretty-printed with `indent` spaces; non-ASCII characters are
    /// written as-is.
    pub fn to_bytes(&self, indent: usize) -> StorageResult<Vec<u8>> {
        match self {
            Self::Text(text) => Ok(text.as_bytes().to_vec()),
            Self::Binary(bytes) => Ok(bytes.clone()),
            Self::Json(value) => {
                let indent = " ".repeat(indent);
                let mut out = Vec::new();
                let mut serializer = serde_json::Serializer::with_formatter(
                    &mut out,
                    PrettyFormatter::with_indent(indent.as_bytes()),
                );
                value.serialize(&mut serializer)?;
                Ok(out)
            }
        }
    }

    /// Interpret bytes as the requested kind
    pub fn from_bytes(bytes: Vec<u8>, kind: ContentKind) -> StorageResult<Self> {
        match kind {
            ContentKind::Binary => Ok(Self::Binary(bytes)),
            ContentKind::Text => String::from_utf8(bytes)
                .map(Self::Text)
                .map_err(|e| StorageError::MalformedData(format!("Invalid UTF-8 text: {}", e))),
            ContentKind::Json => serde_json::from_slice(&bytes)
                .map(Self::Json)
                .map_err(|e| StorageError::MalformedData(format!("Invalid JSON: {}", e))),
        }
    }

    /// Interpret bytes without an explicit kind
    ///
    /// `.json` names parse as JSON and well-known media/archive extensions
    /// stay binary; anything else is text when it is valid UTF-8 and binary
    /// otherwise.
    pub fn detect(name: &str, bytes: Vec<u8>) -> StorageResult<Self> {
        match ContentKind::from_name(name) {
            Some(kind) => Self::from_bytes(bytes, kind),
            None => match String::from_utf8(bytes) {
                Ok(text) => Ok(Self::Text(text)),
                Err(e) => Ok(Self::Binary(e.into_bytes())),
            },
        }
    }

    /// Deserialize JSON content into a concrete type
    pub fn parse_json<T: serde::de::DeserializeOwned>(&self) -> StorageResult<T> {
        match self {
            Self::Json(value) => Ok(T::deserialize(value)?),
            other => Err(StorageError::MalformedData(format!(
                "Expected json content, found {}",
                other.kind()
            ))),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Combine existing content with appended content
    ///
    /// - text + text concatenates
    /// - binary + anything concatenates the serialized bytes
    /// - JSON array + value pushes the value, or extends with an array
    /// - JSON object + JSON object merges keys, the appended side winning
    pub fn append(self, addition: Content, indent: usize) -> StorageResult<Self> {
        match (self, addition) {
            (Self::Text(mut text), Self::Text(more)) => {
                text.push_str(&more);
                Ok(Self::Text(text))
            }
            (Self::Binary(mut bytes), more) => {
                bytes.extend_from_slice(&more.to_bytes(indent)?);
                Ok(Self::Binary(bytes))
            }
            (Self::Json(Value::Array(mut items)), Self::Json(more)) => {
                match more {
                    Value::Array(more) => items.extend(more),
                    value => items.push(value),
                }
                Ok(Self::Json(Value::Array(items)))
            }
            (Self::Json(Value::Object(mut map)), Self::Json(Value::Object(more))) => {
                map.extend(more);
                Ok(Self::Json(Value::Object(map)))
            }
            (existing, more) => Err(StorageError::MalformedData(format!(
                "Cannot append {} content to {} content",
                more.kind(),
                existing.kind()
            ))),
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<&[u8]> for Content {
    fn from(bytes: &[u8]) -> Self {
        Self::Binary(bytes.to_vec())
    }
}
