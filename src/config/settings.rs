use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::Argon2Params;
use crate::errors::{PwVaultError, Result};
use crate::vault::{PasswordPolicy, VaultOptions};

/// Project-level configuration, loaded from `.pwvault.toml`.
///
/// Every field has a sensible default so pwvault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Vault file, relative to the working directory unless absolute.
    #[serde(default = "default_vault_file")]
    pub vault_file: String,

    /// Minimum length of a stored password (default: 8).
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Seconds to wait for another pwvault process to release the vault.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_file() -> String {
    "password.data".to_string()
}

fn default_min_password_length() -> usize {
    crate::vault::policy::DEFAULT_MIN_LENGTH
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_lock_timeout_secs() -> u64 {
    10
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_file: default_vault_file(),
            min_password_length: default_min_password_length(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            lock_timeout_secs: default_lock_timeout_secs(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the working directory.
    pub const FILE_NAME: &'static str = ".pwvault.toml";

    /// Load settings from `<project_dir>/.pwvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed or holds invalid values,
    /// an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            PwVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the engine would refuse later anyway.
    pub fn validate(&self) -> Result<()> {
        if self.vault_file.trim().is_empty() {
            return Err(PwVaultError::ConfigError("vault_file cannot be empty".into()));
        }
        if self.min_password_length == 0 {
            return Err(PwVaultError::ConfigError(
                "min_password_length must be at least 1".into(),
            ));
        }
        self.argon2_params()
            .validate()
            .map_err(|e| PwVaultError::ConfigError(e.to_string()))
    }

    /// Resolve the vault file against `project_dir`.
    pub fn vault_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_file)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    /// Build the engine options for `Vault::open`.
    pub fn vault_options(&self) -> VaultOptions {
        VaultOptions {
            argon2: self.argon2_params(),
            lock_timeout: Duration::from_secs(self.lock_timeout_secs),
            policy: PasswordPolicy {
                min_length: self.min_password_length,
            },
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
