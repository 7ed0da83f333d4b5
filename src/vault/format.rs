//! Binary vault file format.
//!
//! A vault file has this layout (integers little-endian):
//!
//! ```text
//! [PWVT: 4][version: 1][argon2 m: 4][argon2 t: 4][argon2 p: 4]
//! [salt: 32][nonce: 12][ciphertext_len: 4][ciphertext + tag: ciphertext_len]
//! ```
//!
//! - **Magic** (`PWVT`): identifies the file as a pwvault vault.
//! - **Version**: format version (currently `1`); gates future changes.
//! - **Argon2 params**: the KDF settings used at bootstrap, so reopening
//!   derives the same key regardless of current config.
//! - **Salt**: fixed for the lifetime of the file.
//! - **Nonce**: fresh for every write.
//! - **Ciphertext length**: must match the remaining bytes exactly, which
//!   catches truncation before any decryption is attempted.

use crate::crypto::kdf::{Argon2Params, SALT_LEN};
use crate::crypto::{NONCE_LEN, TAG_LEN};
use crate::errors::{PwVaultError, Result};

/// Magic bytes at the start of every vault file.
const MAGIC: &[u8; 4] = b"PWVT";

/// Current binary format version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size header: magic + version + 3 KDF params + salt + nonce + length.
pub const HEADER_LEN: usize = 4 + 1 + 12 + SALT_LEN + NONCE_LEN + 4;

/// An encrypted vault as stored on disk, before decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultContainer {
    pub version: u8,
    pub kdf: Argon2Params,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// AES-256-GCM ciphertext with the tag appended.
    pub ciphertext: Vec<u8>,
}

impl VaultContainer {
    /// Render the container to its on-disk bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let ciphertext_len = u32::try_from(self.ciphertext.len()).map_err(|_| {
            PwVaultError::SerializationError(format!(
                "ciphertext length {} exceeds u32::MAX",
                self.ciphertext.len()
            ))
        })?;

        let mut buf = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        buf.extend_from_slice(MAGIC);
        buf.push(self.version);
        buf.extend_from_slice(&self.kdf.memory_kib.to_le_bytes());
        buf.extend_from_slice(&self.kdf.iterations.to_le_bytes());
        buf.extend_from_slice(&self.kdf.parallelism.to_le_bytes());
        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&self.nonce);
        buf.extend_from_slice(&ciphertext_len.to_le_bytes());
        buf.extend_from_slice(&self.ciphertext);
        Ok(buf)
    }

    /// Parse on-disk bytes.
    ///
    /// Foreign or unsupported headers are `InvalidVaultFormat`.  A vault
    /// cut short inside its header, or a body whose size does
    /// not match the declared length is `CorruptVault`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            // Our own magic (or the start of it) followed by too few bytes
            // is a cut-off vault, not a foreign file.
            let seen = data.len().min(MAGIC.len());
            if data[..seen] == MAGIC[..seen] {
                return Err(PwVaultError::CorruptVault(format!(
                    "vault truncated inside the header ({} of {HEADER_LEN} bytes)",
                    data.len()
                )));
            }
            return Err(PwVaultError::InvalidVaultFormat(format!(
                "file too small to be a vault ({} bytes, header is {HEADER_LEN})",
                data.len()
            )));
        }

        let mut reader = Reader { data, pos: 0 };

        if reader.take::<4>() != *MAGIC {
            return Err(PwVaultError::InvalidVaultFormat(
                "missing PWVT magic bytes".into(),
            ));
        }

        let version = reader.take::<1>()[0];
        if version != CURRENT_VERSION {
            return Err(PwVaultError::InvalidVaultFormat(format!(
                "unsupported version {version}, expected {CURRENT_VERSION}"
            )));
        }

        let kdf = Argon2Params {
            memory_kib: reader.u32(),
            iterations: reader.u32(),
            parallelism: reader.u32(),
        };
        kdf.validate()
            .map_err(|e| PwVaultError::InvalidVaultFormat(format!("stored KDF params: {e}")))?;

        let salt = reader.take::<SALT_LEN>();
        let nonce = reader.take::<NONCE_LEN>();
        let declared = reader.u32() as usize;

        let body = &data[HEADER_LEN..];
        if body.len() != declared {
            return Err(PwVaultError::CorruptVault(format!(
                "ciphertext is {} bytes but header declares {declared}",
                body.len()
            )));
        }
        if body.len() < TAG_LEN {
            return Err(PwVaultError::CorruptVault(
                "ciphertext shorter than the authentication tag".into(),
            ));
        }

        Ok(Self {
            version,
            kdf,
            salt,
            nonce,
            ciphertext: body.to_vec(),
        })
    }
}

/// Cursor over the fixed-width header.  Callers check the total length
/// up front, so individual reads cannot run past the end.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take::<4>())
    }
}
