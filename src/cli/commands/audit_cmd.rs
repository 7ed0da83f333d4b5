//! `pwvault audit`: display the audit log.
//!
//! Usage:
//!   pwvault audit               # show last 50 records
//!   pwvault audit --last 20     # show last 20

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `audit` command.
#[cfg(feature = "audit-log")]
pub fn execute(cli: &Cli, last: usize) -> Result<()> {
    use crate::audit::AuditLog;
    use crate::cli::{output, vault_path};
    use crate::config::Settings;
    use crate::errors::PwVaultError;

    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    let path = vault_path(cli, &settings, &cwd);

    let audit = AuditLog::open(&path)
        .ok_or_else(|| PwVaultError::AuditError("failed to open audit database".into()))?;
    let records = audit.recent(last)?;

    if records.is_empty() {
        output::info("No audit records found.");
        return Ok(());
    }

    print_audit_table(&records);
    Ok(())
}

/// Execute the `audit` command.
#[cfg(not(feature = "audit-log"))]
pub fn execute(_cli: &Cli, _last: usize) -> Result<()> {
    Err(crate::errors::PwVaultError::AuditError(
        "pwvault was built without the audit-log feature".into(),
    ))
}

/// Print audit records in a formatted table.
#[cfg(feature = "audit-log")]
fn print_audit_table(records: &[crate::audit::AuditRecord]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Password Id", "Details"]);

    for record in records {
        table.add_row(vec![
            record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            colorize_operation(&record.operation),
            record.entry_id.as_deref().unwrap_or("-").to_string(),
            record.details.as_deref().unwrap_or("-").to_string(),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit records:", records.len())).bold()
    );
    println!("{table}");
}

/// Colorize operation names for display.
#[cfg(feature = "audit-log")]
fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "init" => style(op).green().to_string(),
        "add" => style(op).blue().to_string(),
        "remove" | "clear" => style(op).red().to_string(),
        _ => op.to_string(),
    }
}
