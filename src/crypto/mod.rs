//! Cryptographic functions for flet-storage
//!
//! Provides AES-256-GCM encryption for optional at-rest encryption of stored
//! files, and provisioning of the random key it runs under.

pub mod encryption;
pub mod key;

pub use encryption::{decrypt, encrypt, is_encrypted, SealedEnvelope};
pub use key::{ensure_key, EncryptionKey, KEY_FILE_NAME};
