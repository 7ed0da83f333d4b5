//! `pwvault add`: store a password, or update the one already stored for
//! the same category and account.

use crate::cli::output;
use crate::cli::{audit, open_vault, prompt_secret, unlock, Cli};
use crate::errors::Result;

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    category: &str,
    account: &str,
    pw: Option<&str>,
    cpw: Option<&str>,
) -> Result<()> {
    let (mut vault, settings) = open_vault(cli)?;
    let secret = prompt_secret(pw, cpw, &settings.vault_options().policy)?;

    unlock(cli, &mut vault, &settings)?;
    let (id, updated) = vault.add(category, account, &secret)?;

    let detail = if updated { "updated" } else { "added" };
    audit(vault.path(), "add", std::slice::from_ref(&id), Some(detail));

    if updated {
        output::success(&format!("password {id} updated"));
    } else {
        output::success(&format!("added password {id}"));
    }

    Ok(())
}
