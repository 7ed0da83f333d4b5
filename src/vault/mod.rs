//! Vault module: the encrypted credential store.
//!
//! This module provides:
//! - The `Entry` record type and its matching rules (`entry`)
//! - Entry collection serialization (`codec`)
//! - The binary vault container format (`format`)
//! - Crash-safe load/save of containers (`repository`)
//! - Cross-process advisory locking (`lock`)
//! - The password strength policy (`policy`)
//! - The `Vault` state machine and record operations (`store`)

pub mod codec;
pub mod entry;
pub mod format;
pub mod lock;
pub mod policy;
pub mod repository;
pub mod store;

// Re-export the most commonly used items.
pub use entry::Entry;
pub use format::VaultContainer;
pub use policy::{check_password, PasswordPolicy};
pub use repository::LoadOutcome;
pub use store::{EntrySink, Vault, VaultOptions, VaultStatus};
