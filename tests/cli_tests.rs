//! End-to-end tests for the chat-evernote binary.
//!
//! Every case runs in an isolated home/config directory with a cleared
//! environment and fails before any network call is made.

use assert_cmd::{cargo_bin_cmd, Command};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Binary with an empty environment rooted in `home`
fn chat_evernote(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("chat-evernote");
    cmd.env_clear()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .current_dir(home.path());
    cmd
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    chat_evernote(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("save"))
        .stdout(predicate::str::contains("notebooks"))
        .stdout(predicate::str::contains("verify"));
}

#[test]
fn test_save_help_shows_flags() {
    let home = TempDir::new().unwrap();
    chat_evernote(&home)
        .args(["save", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--file"))
        .stdout(predicate::str::contains("--notebook"))
        .stdout(predicate::str::contains("--tags"));
}

#[test]
fn test_missing_token_prints_hint() {
    let home = TempDir::new().unwrap();
    chat_evernote(&home)
        .arg("save")
        .write_stdin("Human: hi\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "https://www.evernote.com/api/DeveloperToken.action",
        ))
        .stderr(predicate::str::contains("Missing Evernote developer token"));
}

#[test]
fn test_sandbox_hint_points_at_sandbox() {
    let home = TempDir::new().unwrap();
    chat_evernote(&home)
        .args(["verify", "--sandbox"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sandbox.evernote.com"));
}

#[test]
fn test_empty_input_is_rejected() {
    let home = TempDir::new().unwrap();
    chat_evernote(&home)
        .args(["save", "--token", "S=s1:U=test"])
        .write_stdin("  \n\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no content provided"));
}

#[test]
fn test_missing_file_is_rejected() {
    let home = TempDir::new().unwrap();
    chat_evernote(&home)
        .args(["save", "--token", "S=s1:U=test", "-f", "missing.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read missing.md"));
}

#[test]
fn test_invalid_tag_is_rejected() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join("chat.md"), "Human: hi\n").unwrap();
    chat_evernote(&home)
        .args(["save", "--token", "S=s1:U=test", "-f", "chat.md", "-g", "a,b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot contain a comma"));
}

#[test]
fn test_token_from_env_file() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join(".env"), "EVERNOTE_DEV_TOKEN=S=s1:U=fromfile\n").unwrap();
    chat_evernote(&home)
        .arg("save")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no content provided"))
        .stderr(predicate::str::contains("Missing Evernote developer token").not());
}

#[test]
fn test_malformed_config_fails() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("broken.toml");
    fs::write(&config, "[evernote\ntoken = ").unwrap();
    chat_evernote(&home)
        .arg("--config")
        .arg(&config)
        .arg("verify")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot parse config file"));
}

#[test]
fn test_default_config_file_is_read() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join(".config").join("chat-evernote");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), "[evernote]\ntoken = \"S=s1:U=cfg\"\n").unwrap();
    chat_evernote(&home)
        .arg("save")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no content provided"));
}
