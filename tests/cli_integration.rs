//! Integration tests for the pwvault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.  The
//! master password comes from `PWVAULT_MASTER` so nothing prompts, and a
//! `.pwvault.toml` with cheap Argon2 settings keeps each run fast.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const MASTER: &str = "correct horse battery";

const FAST_CONFIG: &str = "argon2_memory_kib = 8192\nargon2_iterations = 1\nargon2_parallelism = 1\nlock_timeout_secs = 5\n";

/// Helper: get a Command pointing at the pwvault binary.
fn pwvault() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("pwvault").expect("binary should exist")
}

/// Helper: a temp project dir with a fast config.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child(".pwvault.toml").write_str(FAST_CONFIG).unwrap();
    tmp
}

/// Helper: a command run inside `dir` with the master password set.
fn in_dir(dir: &TempDir) -> Command {
    let mut cmd = pwvault();
    cmd.current_dir(dir.path())
        .env("PWVAULT_MASTER", MASTER)
        .env_remove("PASSWORD_MASTER")
        .env_remove("PWVAULT_LOG");
    cmd
}

/// Helper: add a password and return its id from the output.
fn add(dir: &TempDir, category: &str, account: &str, pw: &str) -> String {
    let out = in_dir(dir)
        .args(["add", "-c", category, "-u", account, "--pw", pw])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(out).unwrap();
    let line = stdout
        .lines()
        .find(|l| l.contains("added password"))
        .expect("add should report the new id");
    line.split_whitespace().last().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Basics
// ---------------------------------------------------------------------------

#[test]
fn help_flag_shows_usage() {
    pwvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("master password"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("audit"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn version_flag_shows_version() {
    pwvault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pwvault"));
}

#[test]
fn version_command_shows_version() {
    pwvault()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn no_args_shows_help() {
    pwvault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn add_requires_category_and_account() {
    pwvault().args(["add", "--pw", "long-enough"]).assert().failure();
}

#[test]
fn completions_for_bash() {
    pwvault()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pwvault"));
}

#[test]
fn completions_unknown_shell_fails() {
    pwvault().args(["completions", "csh"]).assert().failure();
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_vault_file() {
    let tmp = project();

    in_dir(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Vault created"));

    tmp.child("password.data").assert(predicate::path::exists());
}

#[test]
fn init_twice_is_harmless() {
    let tmp = project();
    in_dir(&tmp).arg("init").assert().success();
    let before = std::fs::read(tmp.child("password.data").path()).unwrap();

    in_dir(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already initialized"));

    let after = std::fs::read(tmp.child("password.data").path()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn init_rejects_short_master_password() {
    let tmp = project();
    in_dir(&tmp)
        .arg("init")
        .env("PWVAULT_MASTER", "short")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8"));

    tmp.child("password.data").assert(predicate::path::missing());
}

#[test]
fn file_flag_overrides_settings() {
    let tmp = project();
    in_dir(&tmp)
        .args(["init", "--file", "nested/custom.data"])
        .assert()
        .success();

    tmp.child("nested/custom.data")
        .assert(predicate::path::exists());
    tmp.child("password.data").assert(predicate::path::missing());
}

// ---------------------------------------------------------------------------
// Add / list
// ---------------------------------------------------------------------------

#[test]
fn add_then_list_shows_entry() {
    let tmp = project();
    let id = add(&tmp, "email", "alice", "hunter2-long");
    assert_eq!(id.len(), 16);

    in_dir(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(&id))
        .stdout(predicate::str::contains("email"))
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("hunter2-long"));
}

#[test]
fn add_existing_credential_reports_update() {
    let tmp = project();
    let id = add(&tmp, "email", "alice", "hunter2-long");

    in_dir(&tmp)
        .args(["add", "-c", "email", "-u", "alice", "--pw", "brand-new-pw"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("password {id} updated")));

    in_dir(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("brand-new-pw"))
        .stdout(predicate::str::contains("hunter2-long").not());
}

#[test]
fn add_with_mismatched_confirmation_fails() {
    let tmp = project();
    in_dir(&tmp).arg("init").assert().success();

    in_dir(&tmp)
        .args([
            "add", "-c", "email", "-u", "alice", "--pw", "hunter2-long", "--cpw", "hunter3-long",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("do not match"));
}

#[test]
fn add_weak_password_fails() {
    let tmp = project();
    in_dir(&tmp)
        .args(["add", "-c", "email", "-u", "alice", "--pw", "short"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Weak password"));
}

#[test]
fn list_empty_vault() {
    let tmp = project();
    in_dir(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No passwords"));
}

#[test]
fn wrong_master_password_fails() {
    let tmp = project();
    add(&tmp, "email", "alice", "hunter2-long");

    in_dir(&tmp)
        .arg("list")
        .env("PWVAULT_MASTER", "not the master")
        .assert()
        .failure()
        .stderr(predicate::str::contains("wrong master password"));
}

#[test]
fn master_flag_beats_env() {
    let tmp = project();
    add(&tmp, "email", "alice", "hunter2-long");

    in_dir(&tmp)
        .args(["list", "--master", MASTER])
        .env("PWVAULT_MASTER", "not the master")
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"));
}

#[test]
fn password_master_env_is_a_fallback() {
    let tmp = project();
    add(&tmp, "email", "alice", "hunter2-long");

    in_dir(&tmp)
        .arg("list")
        .env_remove("PWVAULT_MASTER")
        .env("PASSWORD_MASTER", MASTER)
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"));

    in_dir(&tmp)
        .arg("list")
        .env("PASSWORD_MASTER", "not the master")
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"));
}

#[test]
fn corrupted_file_fails() {
    let tmp = project();
    tmp.child("password.data")
        .write_binary(b"not a vault file, just some bytes that are long enough to parse")
        .unwrap();

    in_dir(&tmp)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid vault format"));
}

// ---------------------------------------------------------------------------
// Remove
// ---------------------------------------------------------------------------

#[test]
fn remove_by_id_prefix() {
    let tmp = project();
    let id = add(&tmp, "email", "alice", "hunter2-long");

    in_dir(&tmp)
        .args(["remove", "--id", &id[..6]])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("removed password {id}")));

    in_dir(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No passwords"));
}

#[test]
fn remove_unknown_id_fails() {
    let tmp = project();
    add(&tmp, "email", "alice", "hunter2-long");

    in_dir(&tmp)
        .args(["remove", "--id", "zzzz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No password matches"));
}

#[test]
fn remove_by_account_needs_all_when_ambiguous() {
    let tmp = project();
    add(&tmp, "email", "alice", "hunter2-long");
    add(&tmp, "bank", "alice", "hunter2-long");
    add(&tmp, "bank", "bob", "hunter2-long");

    in_dir(&tmp)
        .args(["remove", "-u", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--all"));

    in_dir(&tmp)
        .args(["remove", "-u", "alice", "--all"])
        .assert()
        .success();

    in_dir(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("bob"))
        .stdout(predicate::str::contains("alice").not());
}

#[test]
fn remove_all_clears_vault() {
    let tmp = project();
    let a = add(&tmp, "email", "alice", "hunter2-long");
    let b = add(&tmp, "bank", "bob", "hunter2-long");

    in_dir(&tmp)
        .args(["remove", "-a"])
        .assert()
        .success()
        .stdout(predicate::str::contains(a))
        .stdout(predicate::str::contains(b));

    in_dir(&tmp)
        .args(["remove", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already empty"));
}

#[test]
fn remove_without_target_fails() {
    let tmp = project();
    in_dir(&tmp)
        .arg("remove")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid query"));
}

// ---------------------------------------------------------------------------
// Config and audit
// ---------------------------------------------------------------------------

#[test]
fn invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    tmp.child(".pwvault.toml")
        .write_str("argon2_memory_kib = 16\n")
        .unwrap();

    in_dir(&tmp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file error"));
}

#[cfg(feature = "audit-log")]
#[test]
fn audit_lists_operations() {
    let tmp = project();
    let id = add(&tmp, "email", "alice", "hunter2-long");
    in_dir(&tmp).args(["remove", "--id", &id]).assert().success();

    tmp.child("password.audit.db")
        .assert(predicate::path::exists());

    in_dir(&tmp)
        .args(["audit", "--last", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains(&id))
        .stdout(predicate::str::contains("hunter2-long").not());
}
