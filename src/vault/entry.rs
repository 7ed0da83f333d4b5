//! The credential record stored in a vault, plus the id and matching
//! rules the vault uses to find records.
//!
//! Ids are the first 8 bytes of
//! `SHA-256(label ‖ 0x00 ‖ account ‖ 0x00 ‖ 16 random bytes)` rendered as
//! 16 lowercase hex characters.  The random part means an id cannot be
//! guessed from the label and account alone.

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::TryRngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{PwVaultError, Result};

/// Number of hash bytes kept for an id (16 hex characters).
const ID_BYTES: usize = 8;

/// Size of the random per-entry nonce mixed into the id hash.
const ID_NONCE_LEN: usize = 16;

/// A single credential record.
///
/// The secret is wiped from memory when the entry is dropped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(deny_unknown_fields)]
pub struct Entry {
    pub(crate) id: String,
    pub(crate) label: String,
    pub(crate) account: String,
    pub(crate) secret: String,
    #[zeroize(skip)]
    pub(crate) created_at: DateTime<Utc>,
    #[zeroize(skip)]
    pub(crate) updated_at: DateTime<Utc>,
}

impl Entry {
    /// Build a new entry with a freshly generated id.
    pub fn new(label: &str, account: &str, secret: &str) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: generate_id(label, account)?,
            label: label.to_string(),
            account: account.to_string(),
            secret: secret.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Category of the entry; empty means uncategorized.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace the secret, keeping id and creation time.
    pub(crate) fn set_secret(&mut self, secret: &str) {
        self.secret.zeroize();
        self.secret = secret.to_string();
        self.updated_at = Utc::now();
    }

    /// Exact `(label, account)` match: the same logical credential.
    pub fn is_credential(&self, label: &str, account: &str) -> bool {
        self.label == label && self.account == account
    }

    /// Wildcard match used by removal: an empty field matches anything.
    pub fn matches_account(&self, label: &str, account: &str) -> bool {
        (label.is_empty() || self.label == label) && (account.is_empty() || self.account == account)
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("account", &self.account)
            .field("secret", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Generate an id for a new entry.
pub fn generate_id(label: &str, account: &str) -> Result<String> {
    let mut nonce = [0u8; ID_NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| {
            PwVaultError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("OS RNG unavailable: {e}"),
            ))
        })?;
    Ok(compute_id(label, account, &nonce))
}

/// Deterministic part of id generation.
pub fn compute_id(label: &str, account: &str, nonce: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.update([0u8]);
    hasher.update(account.as_bytes());
    hasher.update([0u8]);
    hasher.update(nonce);
    let digest = hasher.finalize();
    hex::encode(&digest[..ID_BYTES])
}

/// Find entries by id: exact match first, then prefix scan.
///
/// Returns positions in insertion order.  An exact hit short-circuits the
/// prefix scan, so a full id never reports as ambiguous.
pub fn find_by_id(entries: &[Entry], query: &str) -> Vec<usize> {
    if let Some(pos) = entries.iter().position(|e| e.id == query) {
        return vec![pos];
    }
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.id.starts_with(query))
        .map(|(i, _)| i)
        .collect()
}

/// Find entries by label and/or account, empty fields acting as wildcards.
pub fn find_by_account(entries: &[Entry], label: &str, account: &str) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.matches_account(label, account))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with_id(id: &str, label: &str, account: &str) -> Entry {
        let mut e = Entry::new(label, account, "hunter22").unwrap();
        e.id = id.to_string();
        e
    }

    #[test]
    fn ids_are_short_lowercase_hex() {
        let id = generate_id("work", "a@b.com").unwrap();
        assert_eq!(id.len(), ID_BYTES * 2);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn compute_id_is_reproducible() {
        let nonce = [9u8; ID_NONCE_LEN];
        assert_eq!(
            compute_id("work", "a@b.com", &nonce),
            compute_id("work", "a@b.com", &nonce)
        );
    }

    #[test]
    fn field_separator_prevents_ambiguity() {
        let nonce = [0u8; ID_NONCE_LEN];
        assert_ne!(compute_id("ab", "c", &nonce), compute_id("a", "bc", &nonce));
    }

    #[test]
    fn same_credential_gets_different_ids() {
        let a = generate_id("work", "a@b.com").unwrap();
        let b = generate_id("work", "a@b.com").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn exact_id_wins_over_prefix() {
        let entries = vec![
            entry_with_id("abcd", "x", "1"),
            entry_with_id("abcdef", "y", "2"),
        ];
        assert_eq!(find_by_id(&entries, "abcd"), vec![0]);
        assert_eq!(find_by_id(&entries, "abc"), vec![0, 1]);
        assert_eq!(find_by_id(&entries, "abcde"), vec![1]);
        assert!(find_by_id(&entries, "zz").is_empty());
    }

    #[test]
    fn account_wildcards() {
        let entries = vec![
            entry_with_id("01", "work", "alice"),
            entry_with_id("02", "home", "alice"),
            entry_with_id("03", "work", "bob"),
        ];
        assert_eq!(find_by_account(&entries, "work", ""), vec![0, 2]);
        assert_eq!(find_by_account(&entries, "", "alice"), vec![0, 1]);
        assert_eq!(find_by_account(&entries, "home", "alice"), vec![1]);
        assert!(find_by_account(&entries, "home", "bob").is_empty());
    }

    #[test]
    fn is_credential_requires_both_fields() {
        let e = entry_with_id("01", "work", "");
        assert!(e.is_credential("work", ""));
        assert!(!e.is_credential("work", "alice"));
        assert!(!e.is_credential("", ""));
    }

    #[test]
    fn set_secret_keeps_identity() {
        let mut e = Entry::new("work", "alice", "first-secret").unwrap();
        let id = e.id().to_string();
        let created = e.created_at();
        e.set_secret("second-secret");
        assert_eq!(e.id(), id);
        assert_eq!(e.created_at(), created);
        assert_eq!(e.secret(), "second-secret");
        assert!(e.updated_at() >= created);
    }

    #[test]
    fn debug_hides_secret() {
        let e = Entry::new("work", "alice", "s3cret-value").unwrap();
        assert!(!format!("{e:?}").contains("s3cret-value"));
    }
}
