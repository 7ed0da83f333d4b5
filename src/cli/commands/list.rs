//! `pwvault list`: display all stored passwords in a table.

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let vault = unlock_vault(cli)?;
    output::print_entries_table(&vault)
}
