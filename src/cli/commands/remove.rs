//! `pwvault remove`: delete passwords by id prefix, by category/account,
//! or all of them.

use crate::cli::output;
use crate::cli::{audit, unlock_vault, Cli};
use crate::errors::{PwVaultError, Result};

/// Which records a `remove` invocation targets.
#[derive(Debug, PartialEq, Eq)]
enum Target<'a> {
    Id(&'a str),
    Account { category: &'a str, account: &'a str },
    Everything,
}

/// Execute the `remove` command.
pub fn execute(
    cli: &Cli,
    id: Option<&str>,
    category: Option<&str>,
    account: Option<&str>,
    all: bool,
) -> Result<()> {
    let target = select_target(id, category, account, all)?;
    let mut vault = unlock_vault(cli)?;

    let (operation, removed) = match target {
        Target::Id(prefix) => ("remove", vault.remove(prefix, all)?),
        Target::Account { category, account } => {
            ("remove", vault.remove_by_account(category, account, all)?)
        }
        Target::Everything => ("clear", vault.clear()?),
    };

    if removed.is_empty() {
        output::info("Vault is already empty.");
        return Ok(());
    }

    audit(vault.path(), operation, &removed, None);
    output::print_removed(&removed);
    Ok(())
}

/// `--id` wins, then category/account, then `--all` on its own.
fn select_target<'a>(
    id: Option<&'a str>,
    category: Option<&'a str>,
    account: Option<&'a str>,
    all: bool,
) -> Result<Target<'a>> {
    if let Some(id) = id {
        return Ok(Target::Id(id));
    }

    let category = category.unwrap_or_default();
    let account = account.unwrap_or_default();
    if !category.is_empty() || !account.is_empty() {
        return Ok(Target::Account { category, account });
    }

    if all {
        return Ok(Target::Everything);
    }

    Err(PwVaultError::InvalidQuery(
        "pass --id, --category/--account, or --all".into(),
    ))
}
