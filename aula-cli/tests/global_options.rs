//! Integration tests for global options, initialization, and the
//! pool-stats smoke check.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_init_creates_database() {
    let env = TestEnv::new();

    env.command()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(env.data_dir.join("aula.db").exists());
}

#[test]
fn test_init_refuses_to_clobber_without_overwrite() {
    let env = TestEnv::new();
    env.command().arg("init").assert().success();

    env.command().arg("init").assert().failure().code(4);

    env.command()
        .args(["init", "--overwrite"])
        .assert()
        .success();
}

#[test]
fn test_no_auto_init_fails_without_database() {
    let env = TestEnv::new();

    env.command()
        .arg("--no-auto-init")
        .args(["rooms", "list"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Database not found"));
}

#[test]
fn test_commands_auto_initialize() {
    let env = TestEnv::new();

    // No explicit init; the first command creates the database.
    env.command()
        .args(["rooms", "list"])
        .assert()
        .success();
    assert!(env.data_dir.join("aula.db").exists());
}

#[test]
fn test_quiet_book_prints_only_the_id() {
    let env = TestEnv::new();
    env.add_room("Willow", 20);

    let out = env
        .command()
        .arg("--quiet")
        .args([
            "book",
            "--client",
            "Acme Corp",
            "--room",
            "Willow",
            "--start-date",
            "2026-03-02",
        ])
        .output()
        .expect("Failed to run book command");
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.trim().parse::<i64>().is_ok(), "got: {stdout}");
}

#[test]
fn test_invalid_date_is_rejected() {
    let env = TestEnv::new();

    env.command()
        .args(["check", "--start-date", "not-a-date"])
        .assert()
        .failure();
}

#[test]
fn test_inverted_times_are_rejected() {
    let env = TestEnv::new();
    env.add_room("Willow", 20);

    env.command()
        .args([
            "check",
            "--room",
            "Willow",
            "--start-date",
            "2026-03-02",
            "--start-time",
            "14:00",
            "--end-time",
            "09:00",
        ])
        .assert()
        .failure()
        .code(4);
}

#[test]
fn test_pool_stats_reports_configured_capacity() {
    let env = TestEnv::new();
    env.command().arg("init").assert().success();

    let out = env
        .command()
        .args(["pool-stats", "--json"])
        .output()
        .expect("Failed to run pool-stats");
    assert!(out.status.success());
    let stats: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("Output is not valid JSON");
    assert_eq!(stats["capacity"], 10);
    assert_eq!(stats["in_use"], 0);
    assert_eq!(stats["breaker_open"], false);
}

#[test]
fn test_config_file_overrides_pool_capacity() {
    let env = TestEnv::new();
    env.command().arg("init").assert().success();

    let config_path = env.data_dir.join("aula.yml");
    std::fs::write(
        &config_path,
        "pool:\n  capacity: 4\n  saturation_threshold: 0.9\n  backoff_base_ms: 500\n  backoff_max_ms: 5000\n  max_retries: 3\n",
    )
    .expect("Failed to write config");

    let out = env
        .command()
        .arg("--config")
        .arg(&config_path)
        .args(["pool-stats", "--json"])
        .output()
        .expect("Failed to run pool-stats");
    assert!(out.status.success());
    let stats: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("Output is not valid JSON");
    assert_eq!(stats["capacity"], 4);
}

#[test]
fn test_malformed_config_exits_with_config_code() {
    let env = TestEnv::new();
    let config_path = env.data_dir.clone();
    std::fs::create_dir_all(&env.data_dir).unwrap();
    let config_file = config_path.join("bad.yml");
    std::fs::write(&config_file, "pool: [not, a, map]\n").unwrap();

    env.command()
        .arg("--config")
        .arg(&config_file)
        .args(["rooms", "list"])
        .assert()
        .failure()
        .code(7)
        .stderr(predicate::str::contains("Configuration error"));
}
