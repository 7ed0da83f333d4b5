//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{PwVaultError, Result};
use crate::vault::{PasswordPolicy, Vault, VaultStatus};

/// Environment variable holding the master password for scripted use.
pub const MASTER_ENV: &str = "PWVAULT_MASTER";

/// Older name for [`MASTER_ENV`], read when neither `--master` nor
/// `PWVAULT_MASTER` is set.
pub const LEGACY_MASTER_ENV: &str = "PASSWORD_MASTER";

/// pwvault CLI: local password vault behind one master password.
#[derive(Parser)]
#[command(
    name = "pwvault",
    about = "Local password vault protected by a single master password",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault file (default: `vault_file` from .pwvault.toml, else password.data)
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    /// Master password (omit for interactive prompt)
    #[arg(long, env = MASTER_ENV, global = true, hide_env_values = true)]
    pub master: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create the vault file and choose its master password
    Init,

    /// Add a password, or update the one stored for category/account
    Add {
        /// Category the password belongs to (e.g. email, bank)
        #[arg(short = 'c', long)]
        category: String,
        /// Account name within the category
        #[arg(short = 'u', long)]
        account: String,
        /// Password to store (omit for interactive prompt)
        #[arg(long)]
        pw: Option<String>,
        /// Repeat of --pw, checked before anything is stored
        #[arg(long, requires = "pw")]
        cpw: Option<String>,
    },

    /// Remove passwords by id prefix, category/account, or all of them
    Remove {
        /// Password id or unique id prefix
        #[arg(long)]
        id: Option<String>,
        /// Category to match (any category when omitted)
        #[arg(short = 'c', long)]
        category: Option<String>,
        /// Account to match (any account when omitted)
        #[arg(short = 'u', long)]
        account: Option<String>,
        /// Remove every match; with no other filter, empty the vault
        #[arg(short = 'a', long)]
        all: bool,
    },

    /// List all stored passwords
    List,

    /// View the audit log of vault operations
    Audit {
        /// Number of records to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
    },

    /// Show version
    Version,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Non-interactive master password: `--master`, `PWVAULT_MASTER`, then
/// `PASSWORD_MASTER`.  Empty values count as unset.
fn given_master(cli: &Cli) -> Option<Zeroizing<String>> {
    let legacy = std::env::var(LEGACY_MASTER_ENV).ok().map(Zeroizing::new);
    pick_master(cli.master.as_deref(), legacy)
}

fn pick_master(
    flag_or_env: Option<&str>,
    legacy: Option<Zeroizing<String>>,
) -> Option<Zeroizing<String>> {
    match flag_or_env.filter(|pw| !pw.is_empty()) {
        Some(pw) => Some(Zeroizing::new(pw.to_string())),
        None => legacy.filter(|pw| !pw.is_empty()),
    }
}

/// Get the master password, trying in order:
/// 1. `--master` flag or `PWVAULT_MASTER` env var (CI/CD)
/// 2. `PASSWORD_MASTER` env var
/// 3. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn master_password(cli: &Cli) -> Result<Zeroizing<String>> {
    if let Some(pw) = given_master(cli) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter master password")
        .interact()
        .map_err(|e| PwVaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation (used during `init`
/// and the first `add` on an empty vault).
///
/// A password given via flag or env var is checked against the policy
/// but not prompted for.
pub fn prompt_new_master(cli: &Cli, policy: &PasswordPolicy) -> Result<Zeroizing<String>> {
    if let Some(pw) = given_master(cli) {
        policy.check(&pw)?;
        return Ok(pw);
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose master password")
                .with_confirmation(
                    "Confirm master password",
                    "Passwords do not match, try again",
                )
                .interact()
                .map_err(|e| PwVaultError::CommandFailed(format!("password prompt: {e}")))?,
        );

        if let Err(e) = policy.check(&password) {
            output::warning(&format!("{e}. Try again."));
            continue;
        }

        return Ok(password);
    }
}

/// Read the password to store for `add`, from `--pw`/`--cpw` or a
/// confirmed prompt.
///
/// `--pw` without `--cpw` asks for the repeat when stdin is a terminal.
pub fn prompt_secret(
    pw: Option<&str>,
    cpw: Option<&str>,
    policy: &PasswordPolicy,
) -> Result<Zeroizing<String>> {
    match (pw, cpw) {
        (Some(pw), Some(cpw)) => confirm_secret(pw, Some(cpw), policy),
        (Some(pw), None) => {
            output::warning("Password provided on command line, it may appear in shell history.");
            if !std::io::stdin().is_terminal() {
                return confirm_secret(pw, None, policy);
            }
            let repeat = Zeroizing::new(
                dialoguer::Password::new()
                    .with_prompt("Repeat the password")
                    .interact()
                    .map_err(|e| PwVaultError::CommandFailed(format!("password prompt: {e}")))?,
            );
            confirm_secret(pw, Some(&repeat), policy)
        }
        (None, _) => {
            let pw = dialoguer::Password::new()
                .with_prompt("Password to store")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()
                .map_err(|e| PwVaultError::CommandFailed(format!("password prompt: {e}")))?;
            Ok(Zeroizing::new(pw))
        }
    }
}

/// Accept `pw`, checking it against `confirmation` when there is one.
fn confirm_secret(
    pw: &str,
    confirmation: Option<&str>,
    policy: &PasswordPolicy,
) -> Result<Zeroizing<String>> {
    if let Some(repeat) = confirmation {
        policy.check_confirmed(pw, repeat)?;
    }
    Ok(Zeroizing::new(pw.to_string()))
}

/// Resolve the vault file: `--file` wins, else the settings' `vault_file`
/// relative to `cwd`.
pub fn vault_path(cli: &Cli, settings: &Settings, cwd: &Path) -> PathBuf {
    match &cli.file {
        Some(file) => cwd.join(file),
        None => settings.vault_path(cwd),
    }
}

/// Load settings from the working directory and open the vault, without
/// unlocking it.
pub fn open_vault(cli: &Cli) -> Result<(Vault, Settings)> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    let vault = Vault::open(vault_path(cli, &settings, &cwd), settings.vault_options())?;
    Ok((vault, settings))
}

/// Open and unlock the vault, creating it on first use.
pub fn unlock_vault(cli: &Cli) -> Result<Vault> {
    let (mut vault, settings) = open_vault(cli)?;
    unlock(cli, &mut vault, &settings)?;
    Ok(vault)
}

/// Unlock an opened vault, asking for a new master password when the
/// file does not exist yet.
pub fn unlock(cli: &Cli, vault: &mut Vault, settings: &Settings) -> Result<()> {
    let password = if vault.status() == VaultStatus::Uninitialized {
        output::info(&format!(
            "No vault at {}, creating one.",
            vault.path().display()
        ));
        prompt_new_master(cli, &master_policy(settings))?
    } else {
        master_password(cli)?
    };

    vault.unlock_or_bootstrap(&password)
}

/// Policy for choosing a master password.
pub fn master_policy(settings: &Settings) -> PasswordPolicy {
    PasswordPolicy {
        min_length: settings.min_password_length,
    }
}

/// Record an operation in the audit trail, if compiled in.
pub fn audit(vault_path: &Path, operation: &str, entry_ids: &[String], details: Option<&str>) {
    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(vault_path, operation, entry_ids, details);

    #[cfg(not(feature = "audit-log"))]
    let _ = (vault_path, operation, entry_ids, details);
}
