//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::errors::Result;
use crate::vault::{Entry, Vault};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print every entry of an unlocked vault as a table
/// (Id, Category, Account, Password, Updated).
pub fn print_entries_table(vault: &Vault) -> Result<()> {
    if vault.is_empty()? {
        info("No passwords in this vault yet.");
        tip("Run `pwvault add -c <category> -u <account>` to add one.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Category", "Account", "Password", "Updated"]);

    let count = vault.list(&mut |entry: &Entry| {
        table.add_row(vec![
            entry.id().to_string(),
            entry.label().to_string(),
            entry.account().to_string(),
            entry.secret().to_string(),
            entry.updated_at().format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
        Ok(())
    })?;

    println!("{table}");
    println!("{}", style(format!("{count} password(s)")).dim());
    Ok(())
}

/// Print a list of removed ids, one per line.
pub fn print_removed(ids: &[String]) {
    for id in ids {
        success(&format!("removed password {id}"));
    }
}
