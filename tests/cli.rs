//! CLI integration tests for stowage admin commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;
use stowage::config::FileConfig;
use stowage::store::{SqliteStore, Store};
use stowage::types::{LimitSubject, Rule};

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("stowage").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .args([
                "admin",
                "init",
                "--data-dir",
                &self.data_dir_str(),
                "--non-interactive",
            ])
            .assert()
    }

    fn store(&self) -> SqliteStore {
        SqliteStore::new(self.data_dir().join("stowage.db")).expect("open store")
    }
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn init_creates_database_token_and_config_files() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Admin token"));

    assert!(ctx.data_dir().join("stowage.db").exists());
    assert!(ctx.data_dir().join(".admin_token").exists());

    let token_content = std::fs::read_to_string(ctx.data_dir().join(".admin_token"))
        .expect("failed to read token file");
    assert!(token_content.starts_with("stowage_"));

    let config = FileConfig::load(&ctx.data_dir().join("stowage.toml")).expect("load config");
    assert!(!config.quota.enabled);
    assert!(config.quota.default_groups.is_empty());
}

#[test]
fn init_rejects_second_initialization_with_existing_database() {
    let ctx = TestContext::new();

    ctx.init().success();
    ctx.init()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn init_preserves_quota_state_when_reinitialization_rejected() {
    let ctx = TestContext::new();
    ctx.init().success();

    {
        let store = ctx.store();
        let rule = Rule::new("free-total", 1024, vec![LimitSubject::SizeAll]).expect("rule");
        store.create_rule(&rule).expect("create rule");
        store.create_group("free").expect("create group");
        store
            .add_rule_to_group("free", "free-total")
            .expect("add rule");
    }

    ctx.init().failure();

    let group = ctx
        .store()
        .get_group("free")
        .expect("get group")
        .expect("group survives");
    assert_eq!(group.rules[0].name, "free-total");
}

#[test]
fn init_keeps_existing_config_file() {
    let ctx = TestContext::new();
    let config_path = ctx.data_dir().join("stowage.toml");
    std::fs::write(
        &config_path,
        "[quota]\nENABLED = true\nDEFAULT_GROUPS = [\"free\"]\n",
    )
    .expect("write config");

    ctx.init().success();

    let config = FileConfig::load(&config_path).expect("load config");
    assert!(config.quota.enabled);
    assert_eq!(config.quota.default_groups, vec!["free".to_string()]);
}

// ============================================================================
// Serve Tests
// ============================================================================

#[test]
fn serve_refuses_uninitialized_data_dir() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["serve", "--data-dir", &ctx.data_dir_str(), "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn serve_rejects_malformed_config() {
    let ctx = TestContext::new();
    ctx.init().success();
    std::fs::write(ctx.data_dir().join("stowage.toml"), "[quota\nENABLED = yes")
        .expect("write config");

    ctx.cmd()
        .args(["serve", "--data-dir", &ctx.data_dir_str(), "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}
