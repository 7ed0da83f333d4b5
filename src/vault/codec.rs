//! Entry collection <-> plaintext bytes.
//!
//! The plaintext sealed inside a vault is a JSON array of entries in
//! insertion order.  Decoding is strict: unknown fields, missing fields
//! and duplicate ids are all rejected as `MalformedData`.  Because the
//! bytes only reach `decode` after the AEAD tag verified, a failure here
//! means a serializer/version mismatch rather than a wrong password.

use std::collections::HashSet;

use zeroize::Zeroizing;

use super::entry::Entry;
use crate::errors::{PwVaultError, Result};

/// Serialize entries, preserving order.
///
/// The buffer is wrapped in `Zeroizing` since it holds every secret.
pub fn encode(entries: &[Entry]) -> Result<Zeroizing<Vec<u8>>> {
    serde_json::to_vec(entries)
        .map(Zeroizing::new)
        .map_err(|e| PwVaultError::SerializationError(format!("entries: {e}")))
}

/// Parse entries produced by `encode`.
pub fn decode(bytes: &[u8]) -> Result<Vec<Entry>> {
    let entries: Vec<Entry> =
        serde_json::from_slice(bytes).map_err(|e| PwVaultError::MalformedData(e.to_string()))?;

    {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.id()) {
                return Err(PwVaultError::MalformedData(format!(
                    "duplicate entry id '{}'",
                    entry.id()
                )));
            }
        }
    }

    Ok(entries)
}
