//! Symmetric key provisioning
//!
//! The storage key is 32 random bytes kept as URL-safe base64 text in a hidden
//! file inside the temporary root. The same temporary root always yields the
//! same key, so encrypted files stay readable across restarts.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use base64::{engine::general_purpose::URL_SAFE, Engine};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{StorageError, StorageResult};
use crate::storage::file_io::{publish_bytes_with, Access, Publish};

/// Name of the key file inside the temporary root
pub const KEY_FILE_NAME: &str = ".flet_storage.key";

/// Key length in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// A symmetric encryption key, zeroed when dropped
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    key: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Generate a new random key
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Wrap existing key bytes
    pub fn from_bytes(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// Encode the key the way it is stored on disk
    pub fn to_base64(&self) -> String {
        URL_SAFE.encode(self.key)
    }

    /// Decode a key from its on-disk text form
    pub fn from_base64(encoded: &str) -> StorageResult<Self> {
        let mut decoded = URL_SAFE
            .decode(encoded.trim())
            .map_err(|e| StorageError::MalformedData(format!("Invalid key encoding: {}", e)))?;

        if decoded.len() != KEY_SIZE {
            let len = decoded.len();
            decoded.zeroize();
            return Err(StorageError::MalformedData(format!(
                "Invalid key length: expected {}, got {}",
                KEY_SIZE, len
            )));
        }

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self { key })
    }
}

// Never print key material
impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey").finish_non_exhaustive()
    }
}

/// Path of the key file for a temporary root
pub fn key_file_path(temp_dir: &Path) -> PathBuf {
    temp_dir.join(KEY_FILE_NAME)
}

/// Load the key from the temporary root, creating it on first use
///
/// If another process publishes a key between our existence check and our
/// write, its key wins and is returned instead of ours.
pub fn ensure_key(temp_dir: &Path) -> StorageResult<EncryptionKey> {
    let path = key_file_path(temp_dir);

    if path.exists() {
        return load_key(&path);
    }

    fs::create_dir_all(temp_dir).map_err(|e| {
        StorageError::Io(format!(
            "Failed to create key directory {}: {}",
            temp_dir.display(),
            e
        ))
    })?;

    let key = EncryptionKey::generate();
    let mut encoded = key.to_base64();
    let published =
        publish_bytes_with(&path, encoded.as_bytes(), Publish::NoClobber, Access::Private);
    encoded.zeroize();

    match published {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Created storage key");
            Ok(key)
        }
        Err(e) if e.is_already_exists() => {
            tracing::debug!(path = %path.display(), "Key created concurrently, loading it");
            load_key(&path)
        }
        Err(e) => Err(e),
    }
}

fn load_key(path: &Path) -> StorageResult<EncryptionKey> {
    let mut contents = fs::read_to_string(path).map_err(|e| {
        StorageError::Io(format!("Failed to read key file {}: {}", path.display(), e))
    })?;
    let key = EncryptionKey::from_base64(&contents);
    contents.zeroize();
    tracing::debug!(path = %path.display(), "Loaded storage key");
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generated_keys_differ() {
        let key1 = EncryptionKey::generate();
        let key2 = EncryptionKey::generate();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_base64_round_trip() {
        let key = EncryptionKey::generate();
        let decoded = EncryptionKey::from_base64(&key.to_base64()).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let short = URL_SAFE.encode([7u8; 16]);
        let err = EncryptionKey::from_base64(&short).unwrap_err();
        assert!(err.is_malformed());

        let err = EncryptionKey::from_base64("not base64 at all!").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_debug_hides_key() {
        let key = EncryptionKey::from_bytes([0xAB; KEY_SIZE]);
        let debug = format!("{:?}", key);
        assert!(debug.contains("EncryptionKey"));
        assert!(!debug.to_lowercase().contains("ab"));
    }

    #[test]
    fn test_ensure_key_creates_then_reuses() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("tmp");

        let first = ensure_key(&dir).unwrap();
        assert!(key_file_path(&dir).exists());

        let second = ensure_key(&dir).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_corrupt_key_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(key_file_path(temp_dir.path()), "garbage").unwrap();

        let err = ensure_key(temp_dir.path()).unwrap_err();
        assert!(err.is_malformed());
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        ensure_key(temp_dir.path()).unwrap();

        let mode = fs::metadata(key_file_path(temp_dir.path()))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
