//! Password strength policy for stored secrets.
//!
//! One policy gates every path that accepts a secret: inserting a new
//! entry, updating an existing one, and the CLI's confirmation prompt.
//! Rules:
//! - must not be empty
//! - at least `min_length` characters (default 8), counted as chars
//! - at most 4096 characters

use subtle::ConstantTimeEq;

use crate::errors::{PwVaultError, Result};

/// Default minimum number of characters.
pub const DEFAULT_MIN_LENGTH: usize = 8;

/// Hard upper bound on secret length.
pub const MAX_LENGTH: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
        }
    }
}

impl PasswordPolicy {
    /// Check a secret against the policy.
    pub fn check(&self, secret: &str) -> Result<()> {
        if secret.is_empty() {
            return Err(PwVaultError::WeakPassword("password is empty".into()));
        }
        let len = secret.chars().count();
        if len < self.min_length {
            return Err(PwVaultError::WeakPassword(format!(
                "password must be at least {} characters (got {len})",
                self.min_length
            )));
        }
        if len > MAX_LENGTH {
            return Err(PwVaultError::WeakPassword(format!(
                "password must be at most {MAX_LENGTH} characters"
            )));
        }
        Ok(())
    }

    /// Check that `secret` and its repetition agree, then apply `check`.
    pub fn check_confirmed(&self, secret: &str, confirmation: &str) -> Result<()> {
        let equal: bool = secret.as_bytes().ct_eq(confirmation.as_bytes()).into();
        if !equal {
            return Err(PwVaultError::WeakPassword("passwords do not match".into()));
        }
        self.check(secret)
    }
}

/// Check a secret against the default policy.
pub fn check_password(secret: &str) -> Result<()> {
    PasswordPolicy::default().check(secret)
}
