//! Durable storage for vault containers.
//!
//! Knows nothing about keys or entries: it moves `VaultContainer`s
//! between memory and disk.  Writes go to a temp file in the same
//! directory, are fsynced, then renamed over the target, so a crash at
//! any point leaves either the old file or the new one in place.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::format::VaultContainer;
use crate::errors::Result;

/// Result of reading a vault path.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Missing or zero-length file: eligible for bootstrap.
    Empty,
    Container(VaultContainer),
}

/// Read and parse the vault at `path`.
///
/// A present-but-invalid file is an error, never `Empty`.
pub fn load(path: &Path) -> Result<LoadOutcome> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "vault file does not exist");
            return Ok(LoadOutcome::Empty);
        }
        Err(e) => return Err(e.into()),
    };

    if data.is_empty() {
        debug!(path = %path.display(), "vault file is empty");
        return Ok(LoadOutcome::Empty);
    }

    let container = VaultContainer::from_bytes(&data)?;
    debug!(path = %path.display(), bytes = data.len(), "loaded vault container");
    Ok(LoadOutcome::Container(container))
}

/// Write `container` to `path` **atomically**.
///
/// 1. Render the container to bytes.
/// 2. Write them to `.<name>.tmp` next to the target and fsync.
/// 3. Rename the temp file over the target path.
/// 4. Fsync the directory so the rename itself is durable (Unix).
pub fn save(path: &Path, container: &VaultContainer) -> Result<()> {
    let buf = container.to_bytes()?;
    let parent = parent_dir(path);
    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = temp_path(path);

    if let Err(e) = write_synced(&tmp_path, &buf) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    sync_dir(parent);

    debug!(path = %path.display(), bytes = buf.len(), "saved vault container");
    Ok(())
}

/// Path of the scratch file used by `save`.
pub fn temp_path(path: &Path) -> PathBuf {
    parent_dir(path).join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Make the rename durable.  The new container is already in place at
/// this point, so a failure is logged rather than returned.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
        warn!(dir = %dir.display(), error = %e, "could not fsync vault directory");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

fn write_synced(tmp_path: &Path, buf: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    // Owner-only read/write from the moment the file exists.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(tmp_path)?;
    file.write_all(buf)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::{Argon2Params, SALT_LEN};
    use crate::crypto::NONCE_LEN;
    use crate::errors::PwVaultError;
    use crate::vault::format::CURRENT_VERSION;
    use tempfile::TempDir;

    fn container(fill: u8) -> VaultContainer {
        VaultContainer {
            version: CURRENT_VERSION,
            kdf: Argon2Params {
                memory_kib: 8_192,
                iterations: 1,
                parallelism: 1,
            },
            salt: [fill; SALT_LEN],
            nonce: [fill; NONCE_LEN],
            ciphertext: vec![fill; 32],
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let outcome = load(&dir.path().join("password.data")).unwrap();
        assert!(matches!(outcome, LoadOutcome::Empty));
    }

    #[test]
    fn zero_length_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("password.data");
        fs::write(&path, b"").unwrap();
        assert!(matches!(load(&path).unwrap(), LoadOutcome::Empty));
    }

    #[test]
    fn garbage_file_is_not_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("password.data");
        fs::write(&path, b"hello").unwrap();
        assert!(matches!(
            load(&path),
            Err(PwVaultError::InvalidVaultFormat(_))
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("password.data");
        save(&path, &container(1)).unwrap();
        match load(&path).unwrap() {
            LoadOutcome::Container(c) => assert_eq!(c, container(1)),
            LoadOutcome::Empty => panic!("expected a container"),
        }
        assert!(!temp_path(&path).exists(), "temp file must be renamed away");
    }

    #[test]
    fn save_replaces_previous_container() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("password.data");
        save(&path, &container(1)).unwrap();
        save(&path, &container(2)).unwrap();
        match load(&path).unwrap() {
            LoadOutcome::Container(c) => assert_eq!(c, container(2)),
            LoadOutcome::Empty => panic!("expected a container"),
        }
    }

    #[test]
    fn save_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("password.data");
        save(&path, &container(4)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn failed_save_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("password.data");
        save(&path, &container(1)).unwrap();

        // A directory squatting on the temp path makes the write fail.
        fs::create_dir(temp_path(&path)).unwrap();
        assert!(save(&path, &container(2)).is_err());

        match load(&path).unwrap() {
            LoadOutcome::Container(c) => assert_eq!(c, container(1)),
            LoadOutcome::Empty => panic!("expected a container"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("password.data");
        save(&path, &container(1)).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn directory_sync_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        // Returns normally even though there is nothing to open.
        sync_dir(&dir.path().join("gone"));
    }

    #[test]
    fn temp_path_is_hidden_sibling() {
        let path = Path::new("/tmp/vaults/password.data");
        assert_eq!(
            temp_path(path),
            PathBuf::from("/tmp/vaults/.password.data.tmp")
        );
        assert_eq!(
            temp_path(Path::new("password.data")),
            PathBuf::from("./.password.data.tmp")
        );
    }
}
