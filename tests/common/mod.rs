//! Common test utilities for gprops integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's data directory with private profiles.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with isolated data storage.
///
/// Each `TestEnv` creates two temporary directories:
/// - `project_dir`: Acts as the Gradle project root
/// - `data_dir`: Holds private profiles (via `GPROPS_DATA_DIR` env var)
///
/// The `gprops()` method returns a `Command` that sets `GPROPS_DATA_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub project_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            project_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the gprops binary running in the project directory.
    pub fn gprops(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_gprops"));
        cmd.current_dir(self.project_dir.path());
        cmd.env("GPROPS_DATA_DIR", self.data_dir.path());
        cmd.env_remove("GPROPS_PROJECT");
        cmd.env_remove("GPROPS_LOG");
        cmd.env("GPROPS_JAVA_PLATFORMS", "jdk-17=17,jdk-21=21");
        cmd
    }

    /// Get the path to the project directory.
    pub fn path(&self) -> &std::path::Path {
        self.project_dir.path()
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }

    /// Write a file relative to the project directory.
    pub fn write_file(&self, relative: &str, contents: &str) {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    /// Read a file relative to the project directory.
    pub fn read_file(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path().join(relative)).unwrap()
    }

    /// Run gprops with `args` and parse its JSON output.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.gprops().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "gprops {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
