//! One module per subcommand.  Each exposes an `execute` function.

pub mod add;
pub mod audit_cmd;
pub mod completions;
pub mod init;
pub mod list;
pub mod remove;
pub mod version;
