//! Cross-process advisory locking for a vault file.
//!
//! The lock lives on a sibling file (`.<name>.lock`) rather than the
//! vault itself, because `save` replaces the vault inode on every write.
//! Readers take a shared lock, bootstrap and mutations take an exclusive
//! one.  The lock is released when the `FileLock` guard is dropped.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::repository::parent_dir;
use crate::errors::{PwVaultError, Result};

/// Delay between attempts while another process holds the lock.
const RETRY_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// A held advisory lock.  Dropping it releases the lock.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl FileLock {
    /// Acquire a lock guarding `vault_path`, polling until `timeout`.
    ///
    /// A zero timeout makes exactly one attempt.
    pub fn acquire(vault_path: &Path, mode: LockMode, timeout: Duration) -> Result<Self> {
        let path = lock_path(vault_path);
        let parent = parent_dir(&path);
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let deadline = Instant::now() + timeout;
        loop {
            match try_lock(&file, mode) {
                Ok(()) => {
                    debug!(lock = %path.display(), ?mode, "acquired vault lock");
                    return Ok(Self { file, path, mode });
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(PwVaultError::LockTimeout {
                            path: vault_path.to_path_buf(),
                            timeout,
                        });
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Path of the lock file itself.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        unlock(&self.file);
        debug!(lock = %self.path.display(), "released vault lock");
    }
}

/// Path of the lock file guarding `vault_path`.
pub fn lock_path(vault_path: &Path) -> PathBuf {
    parent_dir(vault_path).join(format!(
        ".{}.lock",
        vault_path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

#[cfg(unix)]
fn try_lock(file: &File, mode: LockMode) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let op = match mode {
        LockMode::Shared => libc::LOCK_SH,
        LockMode::Exclusive => libc::LOCK_EX,
    };
    // SAFETY: the descriptor belongs to `file`, which outlives this call.
    let ret = unsafe { libc::flock(file.as_raw_fd(), op | libc::LOCK_NB) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(unix)]
fn unlock(file: &File) {
    use std::os::unix::io::AsRawFd;

    // SAFETY: as above.  Closing the descriptor would release it anyway.
    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File, _mode: LockMode) -> io::Result<()> {
    tracing::warn!("advisory file locking is not supported on this platform");
    Ok(())
}

#[cfg(not(unix))]
fn unlock(_file: &File) {}
