//! `pwvault init`: create a new vault file and choose its master password.

use crate::cli::output;
use crate::cli::{audit, master_policy, open_vault, prompt_new_master, Cli};
use crate::errors::Result;
use crate::vault::VaultStatus;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (mut vault, settings) = open_vault(cli)?;

    if vault.status() != VaultStatus::Uninitialized {
        output::info(&format!(
            "Vault already initialized at {}",
            vault.path().display()
        ));
        output::tip("Run `pwvault add -c <category> -u <account>` to store a password.");
        return Ok(());
    }

    let password = prompt_new_master(cli, &master_policy(&settings))?;
    vault.unlock_or_bootstrap(&password)?;

    audit(vault.path(), "init", &[], Some("vault created"));
    output::success(&format!("Vault created at {}", vault.path().display()));
    output::tip("Run `pwvault add -c <category> -u <account>` to store a password.");
    output::tip("Run `pwvault list` to see all passwords.");

    Ok(())
}
