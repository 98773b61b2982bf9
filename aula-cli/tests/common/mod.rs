//! Common test utilities for CLI integration tests.
//!
//! Provides an isolated test environment with a temporary data
//! directory plus helpers for the command sequences most tests need.

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test environment with isolated data directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the aula data directory
    pub data_dir: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join("aula-data");
        Self { temp_dir, data_dir }
    }

    /// Get a bare command builder without pre-configured flags.
    pub fn command_bare(&self) -> Command {
        Command::cargo_bin("aula").expect("Failed to find aula binary")
    }

    /// Get a command builder with the data directory pre-configured.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--data-dir").arg(&self.data_dir);
        // Keep host configuration out of the test environment.
        cmd.env_remove("AULA_CONFIG")
            .env_remove("AULA_DATA_DIR")
            .env_remove("AULA_NO_AUTO_INIT")
            .env_remove("AULA_POOL_CAPACITY")
            .env_remove("AULA_LOW_STOCK_THRESHOLD");
        cmd
    }

    /// Add a room and return its id.
    pub fn add_room(&self, name: &str, capacity: u32) -> i64 {
        let output = self
            .command()
            .args(["rooms", "add", name, "--capacity"])
            .arg(capacity.to_string())
            .output()
            .expect("Failed to run rooms add");
        assert!(
            output.status.success(),
            "rooms add failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8(output.stdout).expect("Invalid UTF-8 in output");
        // "Added room NAME (id N)"
        stdout
            .trim()
            .rsplit_once("id ")
            .and_then(|(_, tail)| tail.trim_end_matches(')').parse().ok())
            .expect("Output did not contain a room id")
    }

    /// Link two rooms as combinable neighbors.
    pub fn link_rooms(&self, parent: &str, child: &str) {
        self.command()
            .args(["rooms", "link", parent, child])
            .assert()
            .success();
    }

    /// Create a booking for a room over one day and return its id.
    pub fn book(&self, client: &str, room: &str, date: &str) -> i64 {
        let output = self
            .command()
            .arg("--quiet")
            .args(["book", "--client", client, "--room", room, "--start-date", date])
            .output()
            .expect("Failed to run book command");
        assert!(
            output.status.success(),
            "book failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout)
            .expect("Invalid UTF-8 in output")
            .trim()
            .parse()
            .expect("Output is not a booking id")
    }

    /// Create a room-less booking request and return its id.
    pub fn book_roomless(&self, client: &str, date: &str) -> i64 {
        let output = self
            .command()
            .arg("--quiet")
            .args(["book", "--client", client, "--start-date", date])
            .output()
            .expect("Failed to run book command");
        assert!(
            output.status.success(),
            "book failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout)
            .expect("Invalid UTF-8 in output")
            .trim()
            .parse()
            .expect("Output is not a booking id")
    }

    /// Add a device and return its id.
    pub fn add_device(&self, serial: &str, category: &str) -> i64 {
        let output = self
            .command()
            .args(["devices", "add", serial, serial, "--category", category])
            .output()
            .expect("Failed to run devices add");
        assert!(
            output.status.success(),
            "devices add failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8(output.stdout).expect("Invalid UTF-8 in output");
        stdout
            .trim()
            .rsplit_once("id ")
            .and_then(|(_, tail)| tail.trim_end_matches(')').parse().ok())
            .expect("Output did not contain a device id")
    }

    /// Assign a device to a booking and return the assignment id.
    pub fn assign_device(&self, booking_id: i64, device: &str) -> i64 {
        let output = self
            .command()
            .arg("--quiet")
            .args(["devices", "assign"])
            .arg(booking_id.to_string())
            .arg(device)
            .output()
            .expect("Failed to run devices assign");
        assert!(
            output.status.success(),
            "devices assign failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout)
            .expect("Invalid UTF-8 in output")
            .trim()
            .parse()
            .expect("Output is not an assignment id")
    }

    /// List bookings and return stdout.
    pub fn bookings(&self) -> String {
        let output = self
            .command()
            .arg("bookings")
            .output()
            .expect("Failed to run bookings command");
        assert!(
            output.status.success(),
            "bookings failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("Invalid UTF-8 in output")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
