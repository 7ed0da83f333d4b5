//! `pwvault version`: display version information.

use console::style;

use crate::errors::Result;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    let current = env!("CARGO_PKG_VERSION");
    println!("pwvault {current}");
    println!(
        "{}",
        style(format!(
            "audit log: {}",
            if cfg!(feature = "audit-log") {
                "enabled"
            } else {
                "disabled"
            }
        ))
        .dim()
    );
    Ok(())
}
