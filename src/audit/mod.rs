//! Audit log: SQLite-based operation history.
//!
//! Stores a record of every vault operation (init, add, remove, clear)
//! in a local SQLite database next to the vault file
//! (`password.data` -> `password.audit.db`).  Only entry ids and short
//! details are recorded, never labels' secrets or the master password.
//!
//! Designed for graceful degradation: if the database can't be opened or
//! written to, operations silently continue without logging.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::debug;

use crate::errors::{PwVaultError, Result};

/// A single audit log record.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub entry_id: Option<String>,
    pub details: Option<String>,
}

/// SQLite-backed audit log.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database belonging to `vault_path`.
    ///
    /// Returns `None` if the database can't be opened; callers should
    /// treat this as "audit logging unavailable" and continue normally.
    pub fn open(vault_path: &Path) -> Option<Self> {
        let db_path = Self::db_path(vault_path);
        let conn = match Connection::open(&db_path) {
            Ok(conn) => conn,
            Err(e) => {
                debug!(error = %e, "audit log unavailable");
                return None;
            }
        };

        // Set restrictive permissions on the audit database (owner-only).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp   TEXT NOT NULL,
                operation   TEXT NOT NULL,
                entry_id    TEXT,
                details     TEXT
            );",
        )
        .ok()?;

        Some(Self { conn })
    }

    /// Record one operation touching `entry_ids`.  An empty slice records
    /// a single row with no entry id.  Errors are silently ignored.
    pub fn log(&self, operation: &str, entry_ids: &[String], details: Option<&str>) {
        let now = Utc::now().to_rfc3339();
        let insert = |entry_id: Option<&str>| {
            let _ = self.conn.execute(
                "INSERT INTO audit_log (timestamp, operation, entry_id, details)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![now, operation, entry_id, details],
            );
        };

        if entry_ids.is_empty() {
            insert(None);
        }
        for id in entry_ids {
            insert(Some(id));
        }
    }

    /// Most recent records first, at most `limit` of them.
    pub fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, operation, entry_id, details
                 FROM audit_log
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(|e| PwVaultError::AuditError(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map([limit_i64], |row| {
                let ts_str: String = row.get(1)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                    .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

                Ok(AuditRecord {
                    id: row.get(0)?,
                    timestamp,
                    operation: row.get(2)?,
                    entry_id: row.get(3)?,
                    details: row.get(4)?,
                })
            })
            .map_err(|e| PwVaultError::AuditError(format!("query exec: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| PwVaultError::AuditError(format!("row parse: {e}")))?);
        }

        Ok(records)
    }

    /// Path of the audit database for a vault file.
    pub fn db_path(vault_path: &Path) -> PathBuf {
        let stem = vault_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pwvault".to_string());
        vault_path.with_file_name(format!("{stem}.audit.db"))
    }
}

/// Convenience helper: log an event for the vault at `vault_path`.
///
/// Never fails the parent operation.
pub fn log_audit(vault_path: &Path, operation: &str, entry_ids: &[String], details: Option<&str>) {
    if let Some(audit) = AuditLog::open(vault_path) {
        audit.log(operation, entry_ids, details);
    }
}
