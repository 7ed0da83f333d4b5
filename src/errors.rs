use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// All errors that can occur in pwvault.
#[derive(Debug, Error)]
pub enum PwVaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// AEAD tag mismatch. Wrong key and corrupted ciphertext look the same here.
    #[error("Decryption failed: authentication tag mismatch")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault file errors ---
    #[error("Invalid vault format: {0}")]
    InvalidVaultFormat(String),

    #[error("Vault is corrupt: {0}")]
    CorruptVault(String),

    #[error("Cannot unlock vault: wrong master password or corrupted file")]
    WrongMasterPassword,

    #[error("Malformed vault data: {0}")]
    MalformedData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Timed out after {timeout:?} waiting for the lock on {path}")]
    LockTimeout { path: PathBuf, timeout: Duration },

    #[error("Generated entry id '{0}' collides with an existing entry")]
    IdCollision(String),

    // --- Record errors ---
    #[error("Vault is locked: unlock it with the master password first")]
    VaultLocked,

    #[error("No password matches '{0}'")]
    EntryNotFound(String),

    #[error("'{query}' matches {} passwords, pass --all to remove every match", .ids.len())]
    AmbiguousMatch { query: String, ids: Vec<String> },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Weak password: {0}")]
    WeakPassword(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Audit error: {0}")]
    AuditError(String),
}

/// Convenience type alias for pwvault results.
pub type Result<T> = std::result::Result<T, PwVaultError>;
