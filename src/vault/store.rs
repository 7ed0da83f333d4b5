//! The vault engine: unlock/bootstrap state machine and record operations.
//!
//! `Vault` ties the other layers together.  One value is built per
//! invocation with `Vault::open`, unlocked with `unlock_or_bootstrap`,
//! then used for any number of record operations.
//!
//! Every mutation runs under the exclusive file lock and follows the
//! same sequence: refresh from disk if another process wrote since we
//! last looked, apply the change to a copy, encode, encrypt with a fresh
//! nonce, save atomically, and only then swap the copy in.  A failure at
//! any step leaves memory and disk untouched.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto::kdf::{derive_key, generate_salt, Argon2Params, SALT_LEN};
use crate::crypto::{decrypt, encrypt, generate_nonce, MasterKey, NONCE_LEN};
use crate::errors::{PwVaultError, Result};

use super::codec;
use super::entry::{find_by_account, find_by_id, Entry};
use super::format::{VaultContainer, CURRENT_VERSION};
use super::lock::{FileLock, LockMode};
use super::policy::PasswordPolicy;
use super::repository::{self, LoadOutcome};

/// Tunables for a vault handle.
#[derive(Debug, Clone, Copy)]
pub struct VaultOptions {
    /// KDF parameters used when bootstrapping a new vault.  Existing
    /// vaults always use the parameters stored in their header.
    pub argon2: Argon2Params,
    /// How long to wait for another process to release the file lock.
    pub lock_timeout: Duration,
    /// Policy applied to every secret passed to `add`.
    pub policy: PasswordPolicy,
}

impl Default for VaultOptions {
    fn default() -> Self {
        Self {
            argon2: Argon2Params::default(),
            lock_timeout: Duration::from_secs(10),
            policy: PasswordPolicy::default(),
        }
    }
}

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultStatus {
    /// The backing file is missing or empty.
    Uninitialized,
    /// A container exists but no key has been derived yet.
    Locked,
    Unlocked,
}

/// Receives entries from `Vault::list`.
///
/// Any `FnMut(&Entry) -> Result<()>` closure is a sink.
pub trait EntrySink {
    fn accept(&mut self, entry: &Entry) -> Result<()>;
}

impl<F> EntrySink for F
where
    F: FnMut(&Entry) -> Result<()>,
{
    fn accept(&mut self, entry: &Entry) -> Result<()> {
        self(entry)
    }
}

/// Key material and plaintext state, present only while unlocked.
struct Session {
    key: MasterKey,
    kdf: Argon2Params,
    salt: [u8; SALT_LEN],
    /// Nonce of the container we last read or wrote; a different one on
    /// disk means another process has written since.
    nonce: [u8; NONCE_LEN],
    entries: Vec<Entry>,
}

enum State {
    Uninitialized,
    Locked(VaultContainer),
    Unlocked(Session),
}

/// The main vault handle.
pub struct Vault {
    path: PathBuf,
    options: VaultOptions,
    state: State,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("path", &self.path)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Vault {
    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Open the vault at `path` without deriving any key.
    ///
    /// The result is `Uninitialized` for a missing or empty file and
    /// `Locked` otherwise.  A present but unreadable file is an error.
    pub fn open(path: impl Into<PathBuf>, options: VaultOptions) -> Result<Self> {
        let path = path.into();
        let outcome = {
            let _lock = FileLock::acquire(&path, LockMode::Shared, options.lock_timeout)?;
            repository::load(&path)?
        };

        let state = match outcome {
            LoadOutcome::Empty => State::Uninitialized,
            LoadOutcome::Container(container) => State::Locked(container),
        };

        let vault = Self {
            path,
            options,
            state,
        };
        debug!(path = %vault.path.display(), status = ?vault.status(), "opened vault");
        Ok(vault)
    }

    /// Unlock an existing vault, or create one if the file is empty.
    ///
    /// Calling it again once unlocked is a no-op.
    pub fn unlock_or_bootstrap(&mut self, master_password: &str) -> Result<()> {
        match &self.state {
            State::Unlocked(_) => Ok(()),
            State::Locked(container) => {
                let session = unlock_container(container, master_password)?;
                info!(entries = session.entries.len(), "vault unlocked");
                self.state = State::Unlocked(session);
                Ok(())
            }
            State::Uninitialized => self.bootstrap(master_password),
        }
    }

    fn bootstrap(&mut self, master_password: &str) -> Result<()> {
        let _lock = FileLock::acquire(&self.path, LockMode::Exclusive, self.options.lock_timeout)?;

        // Someone else may have created the vault since `open`.
        if let LoadOutcome::Container(container) = repository::load(&self.path)? {
            debug!("vault was created concurrently, unlocking instead");
            let session = unlock_container(&container, master_password)?;
            self.state = State::Unlocked(session);
            return Ok(());
        }

        let kdf = self.options.argon2;
        let salt = generate_salt()?;
        let key = derive_key(master_password.as_bytes(), &salt, &kdf)?;
        let mut session = Session {
            key,
            kdf,
            salt,
            nonce: [0u8; NONCE_LEN],
            entries: Vec::new(),
        };
        session.nonce = persist(&self.path, &session, &[])?;

        info!(path = %self.path.display(), "bootstrapped new vault");
        self.state = State::Unlocked(session);
        Ok(())
    }

    /// Current lifecycle state.
    pub fn status(&self) -> VaultStatus {
        match self.state {
            State::Uninitialized => VaultStatus::Uninitialized,
            State::Locked(_) => VaultStatus::Locked,
            State::Unlocked(_) => VaultStatus::Unlocked,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------

    /// Add a password, or update the secret of an existing
    /// `(label, account)` entry.
    ///
    /// Returns the entry id and whether an existing entry was updated.
    /// The password policy runs before anything changes, on both paths.
    pub fn add(&mut self, label: &str, account: &str, secret: &str) -> Result<(String, bool)> {
        self.session()?;
        self.options.policy.check(secret)?;

        let (id, updated) = self.mutate(|entries| {
            if let Some(existing) = entries.iter_mut().find(|e| e.is_credential(label, account)) {
                existing.set_secret(secret);
                return Ok((existing.id().to_string(), true));
            }

            let entry = Entry::new(label, account, secret)?;
            if entries.iter().any(|e| e.id() == entry.id()) {
                return Err(PwVaultError::IdCollision(entry.id().to_string()));
            }
            let id = entry.id().to_string();
            entries.push(entry);
            Ok((id, false))
        })?;

        info!(%id, updated, "stored password");
        Ok((id, updated))
    }

    /// Remove entries by id or id prefix.
    ///
    /// A single match is removed outright.  Several matches are an
    /// `AmbiguousMatch` unless `remove_all` is set.
    pub fn remove(&mut self, id_or_prefix: &str, remove_all: bool) -> Result<Vec<String>> {
        self.session()?;
        if id_or_prefix.is_empty() {
            return Err(PwVaultError::InvalidQuery("password id is empty".into()));
        }

        let removed = self.mutate(|entries| {
            let matches = find_by_id(entries, id_or_prefix);
            take_matches(entries, matches, id_or_prefix, remove_all)
        })?;

        info!(count = removed.len(), "removed passwords by id");
        Ok(removed)
    }

    /// Remove entries by label and/or account.  An empty field matches
    /// any value; both empty is an `InvalidQuery`.
    pub fn remove_by_account(
        &mut self,
        label: &str,
        account: &str,
        remove_all: bool,
    ) -> Result<Vec<String>> {
        self.session()?;
        if label.is_empty() && account.is_empty() {
            return Err(PwVaultError::InvalidQuery(
                "specify a category, an account, or both".into(),
            ));
        }

        let query = describe_account_query(label, account);
        let removed = self.mutate(|entries| {
            let matches = find_by_account(entries, label, account);
            take_matches(entries, matches, &query, remove_all)
        })?;

        info!(count = removed.len(), "removed passwords by account");
        Ok(removed)
    }

    /// Remove every entry.  Returns the removed ids in their prior order.
    ///
    /// An empty vault, checked after reloading from disk, is not rewritten.
    pub fn clear(&mut self) -> Result<Vec<String>> {
        self.session()?;

        let removed = self.mutate(|entries| {
            let ids: Vec<String> = entries.iter().map(|e| e.id().to_string()).collect();
            entries.clear();
            Ok(ids)
        })?;

        info!(count = removed.len(), "cleared vault");
        Ok(removed)
    }

    /// Entries in insertion order.
    ///
    /// The iterator is lazy and finite; call again to restart it.
    pub fn entries(&self) -> Result<std::slice::Iter<'_, Entry>> {
        Ok(self.session()?.entries.iter())
    }

    /// Number of entries in the unlocked vault.
    pub fn len(&self) -> Result<usize> {
        Ok(self.session()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Feed every entry, in insertion order, to `sink`.
    ///
    /// Returns the number of entries written.  Stops at the first sink
    /// error.
    pub fn list<S>(&self, sink: &mut S) -> Result<usize>
    where
        S: EntrySink + ?Sized,
    {
        let mut count = 0;
        for entry in self.entries()? {
            sink.accept(entry)?;
            count += 1;
        }
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn session(&self) -> Result<&Session> {
        match &self.state {
            State::Unlocked(session) => Ok(session),
            _ => Err(PwVaultError::VaultLocked),
        }
    }

    /// Run `change` against a copy of the entries and persist the result.
    ///
    /// The in-memory collection is replaced only after the save succeeds.
    /// A change that leaves the refreshed entries as they were writes
    /// nothing.
    fn mutate<T, F>(&mut self, change: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Entry>) -> Result<T>,
    {
        let _lock = FileLock::acquire(&self.path, LockMode::Exclusive, self.options.lock_timeout)?;

        let session = match &mut self.state {
            State::Unlocked(session) => session,
            _ => return Err(PwVaultError::VaultLocked),
        };

        refresh(&self.path, session)?;

        let mut next = session.entries.clone();
        let out = change(&mut next)?;
        if next == session.entries {
            debug!("no change to persist");
            return Ok(out);
        }
        session.nonce = persist(&self.path, session, &next)?;
        session.entries = next;
        Ok(out)
    }
}

/// Derive the key for `container` and decrypt its entries.
fn unlock_container(container: &VaultContainer, master_password: &str) -> Result<Session> {
    let key = derive_key(master_password.as_bytes(), &container.salt, &container.kdf)?;
    let entries = open_entries(&key, container)?;
    Ok(Session {
        key,
        kdf: container.kdf,
        salt: container.salt,
        nonce: container.nonce,
        entries,
    })
}

/// Decrypt and decode a container with an already derived key.
///
/// A tag mismatch means the password is wrong (or the bytes were
/// damaged, which is indistinguishable); a decode failure after a good
/// tag means the payload itself is corrupt.
fn open_entries(key: &MasterKey, container: &VaultContainer) -> Result<Vec<Entry>> {
    let plaintext = decrypt(key.as_bytes(), &container.nonce, &container.ciphertext)
        .map(Zeroizing::new)
        .map_err(|e| match e {
            PwVaultError::DecryptionFailed => PwVaultError::WrongMasterPassword,
            other => other,
        })?;

    codec::decode(&plaintext).map_err(|e| match e {
        PwVaultError::MalformedData(msg) => PwVaultError::CorruptVault(msg),
        other => other,
    })
}

/// Reload the entries if the file on disk changed since we last saw it.
///
/// Must be called with the exclusive lock held.
fn refresh(path: &Path, session: &mut Session) -> Result<()> {
    let container = match repository::load(path)? {
        LoadOutcome::Container(container) => container,
        LoadOutcome::Empty => {
            return Err(PwVaultError::CorruptVault(
                "vault file was removed while unlocked".into(),
            ))
        }
    };

    if container.nonce == session.nonce {
        return Ok(());
    }

    if container.salt != session.salt || container.kdf != session.kdf {
        return Err(PwVaultError::WrongMasterPassword);
    }

    debug!("vault changed on disk, reloading entries");
    session.entries = open_entries(&session.key, &container)?;
    session.nonce = container.nonce;
    Ok(())
}

/// Encode, encrypt and save `entries`; returns the nonce that was used.
fn persist(path: &Path, session: &Session, entries: &[Entry]) -> Result<[u8; NONCE_LEN]> {
    let plaintext = codec::encode(entries)?;
    let nonce = generate_nonce()?;
    let ciphertext = encrypt(session.key.as_bytes(), &nonce, &plaintext)?;

    let container = VaultContainer {
        version: CURRENT_VERSION,
        kdf: session.kdf,
        salt: session.salt,
        nonce,
        ciphertext,
    };
    repository::save(path, &container)?;
    Ok(nonce)
}

/// Apply the ambiguity policy to `matches` and remove the chosen entries.
fn take_matches(
    entries: &mut Vec<Entry>,
    matches: Vec<usize>,
    query: &str,
    remove_all: bool,
) -> Result<Vec<String>> {
    match matches.len() {
        0 => Err(PwVaultError::EntryNotFound(query.to_string())),
        1 => Ok(drain_positions(entries, &matches)),
        _ if remove_all => Ok(drain_positions(entries, &matches)),
        _ => Err(PwVaultError::AmbiguousMatch {
            query: query.to_string(),
            ids: matches.iter().map(|&i| entries[i].id().to_string()).collect(),
        }),
    }
}

/// Remove entries at the given ascending positions, returning their ids
/// in order.
fn drain_positions(entries: &mut Vec<Entry>, positions: &[usize]) -> Vec<String> {
    let ids = positions
        .iter()
        .map(|&i| entries[i].id().to_string())
        .collect();
    let mut index = 0;
    entries.retain(|_| {
        let keep = positions.binary_search(&index).is_err();
        index += 1;
        keep
    });
    ids
}

fn describe_account_query(label: &str, account: &str) -> String {
    match (label.is_empty(), account.is_empty()) {
        (false, false) => format!("{label}/{account}"),
        (false, true) => format!("category {label}"),
        _ => format!("account {account}"),
    }
}
