//! AES-256-GCM authenticated encryption.
//!
//! The nonce is supplied by the caller so it can live in the vault
//! header next to the salt.  `generate_nonce` must be called for every
//! write: a nonce is never reused with the same key.
//!
//! Layout of the returned byte buffer:
//!   [ ciphertext | 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::errors::{PwVaultError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Generate a fresh random 12-byte nonce.
pub fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| PwVaultError::EncryptionFailed(format!("OS RNG unavailable: {e}")))?;
    Ok(nonce)
}

/// Encrypt `plaintext` with a 32-byte `key` under `nonce`.
///
/// Returns the ciphertext with the auth tag appended.
pub fn encrypt(key: &[u8], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| PwVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| PwVaultError::EncryptionFailed(format!("encryption error: {e}")))
}

/// Decrypt data that was produced by `encrypt`.
///
/// Any failure (wrong key, flipped bit, truncated tag) is reported as
/// `DecryptionFailed` and nothing else.
pub fn decrypt(key: &[u8], nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_LEN {
        return Err(PwVaultError::DecryptionFailed);
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| PwVaultError::DecryptionFailed)?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| PwVaultError::DecryptionFailed)
}
