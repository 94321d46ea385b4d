//! AES-256-GCM encryption/decryption
//!
//! Provides authenticated encryption for stored files. Each encryption
//! operation generates a unique nonce. The result is framed as an envelope:
//!
//! ```text
//! "E::" | version (1 byte) | nonce (12 bytes) | ciphertext + tag
//! ```

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};

use crate::error::{StorageError, StorageResult};

use super::EncryptionKey;

/// Marker every encrypted file starts with
pub const MAGIC: &[u8; 3] = b"E::";

/// Current envelope version
const VERSION: u8 = 1;

/// Size of the AES-GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
const TAG_SIZE: usize = 16;

const HEADER_SIZE: usize = MAGIC.len() + 1 + NONCE_SIZE;

/// An encrypted payload with the nonce it was sealed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedEnvelope {
    /// The nonce used for this encryption
    pub nonce: [u8; NONCE_SIZE],
    /// The encrypted ciphertext with authentication tag
    pub ciphertext: Vec<u8>,
}

impl SealedEnvelope {
    /// Serialize to the on-disk frame
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len());
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse the on-disk frame
    ///
    /// Anything that is not a well-formed envelope (including plain files that
    /// were never encrypted) is reported as a decryption failure.
    pub fn parse(bytes: &[u8]) -> StorageResult<Self> {
        let body = bytes.strip_prefix(MAGIC.as_slice()).ok_or_else(|| {
            StorageError::DecryptionFailed("data is not encrypted".to_string())
        })?;

        let (&version, rest) = body.split_first().ok_or_else(|| {
            StorageError::DecryptionFailed("truncated envelope header".to_string())
        })?;

        if version != VERSION {
            return Err(StorageError::DecryptionFailed(format!(
                "unsupported envelope version: {}",
                version
            )));
        }

        if rest.len() < NONCE_SIZE + TAG_SIZE {
            return Err(StorageError::DecryptionFailed(format!(
                "envelope too short: {} bytes",
                bytes.len()
            )));
        }

        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// Check whether bytes look like an envelope, without authenticating them
pub fn is_encrypted(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_SIZE + TAG_SIZE && bytes.starts_with(MAGIC) && bytes[MAGIC.len()] == VERSION
}

/// Seal plaintext into an envelope
pub fn seal(plaintext: &[u8], key: &EncryptionKey) -> StorageResult<SealedEnvelope> {
    // Create cipher from key
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| StorageError::Encryption(format!("Failed to create cipher: {}", e)))?;

    // Generate random nonce
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| StorageError::Encryption(format!("Encryption failed: {}", e)))?;

    Ok(SealedEnvelope {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Open an envelope and authenticate its contents
pub fn open(envelope: &SealedEnvelope, key: &EncryptionKey) -> StorageResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| StorageError::Encryption(format!("Failed to create cipher: {}", e)))?;

    let nonce = Nonce::from_slice(&envelope.nonce);

    cipher
        .decrypt(nonce, envelope.ciphertext.as_ref())
        .map_err(|_| StorageError::DecryptionFailed("invalid key or corrupted data".to_string()))
}

/// Encrypt bytes into the on-disk envelope format
pub fn encrypt(plaintext: &[u8], key: &EncryptionKey) -> StorageResult<Vec<u8>> {
    Ok(seal(plaintext, key)?.to_bytes())
}

/// Decrypt bytes in the on-disk envelope format
pub fn decrypt(bytes: &[u8], key: &EncryptionKey) -> StorageResult<Vec<u8>> {
    let envelope = SealedEnvelope::parse(bytes)?;
    open(&envelope, key)
}
