//! gradle-props - Layered configuration profiles for Gradle projects.
//!
//! This library provides the core functionality for the `gprops` CLI tool:
//! observable typed properties, per-profile settings stores backed by XML
//! files, lazy merging of a profile against the shared default profile,
//! and the editor seam used to build settings UIs.

pub mod cli;
pub mod commands;
pub mod config;
pub mod gradle;
pub mod property;
pub mod settings;
pub mod storage;
pub mod tree;

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::config::ProjectProperties;
    use crate::gradle::{JavaPlatform, PlatformOrder, StaticPlatformProvider};
    use crate::settings::ProfileSettingsContainer;
    use crate::storage::FilePersister;

    /// Test environment with an isolated project and data directory.
    pub struct TestEnv {
        /// Simulated project directory
        pub project_dir: TempDir,
        /// Isolated data directory for private profiles
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

        /// Get the path to the simulated project.
        pub fn path(&self) -> &Path {
            self.project_dir.path()
        }

        /// Get the path to the isolated data directory.
        pub fn data_path(&self) -> &Path {
            self.data_dir.path()
        }

        /// File persister rooted in this environment.
        pub fn persister(&self) -> FilePersister {
            FilePersister::with_data_dir(self.path(), self.data_path()).unwrap()
        }

        /// Standard project properties with two installed JDKs.
        pub fn properties(&self) -> ProjectProperties {
            let provider = StaticPlatformProvider::new(vec![
                JavaPlatform::new("jdk-17", "17"),
                JavaPlatform::new("jdk-21", "21"),
            ]);
            ProjectProperties::new(Arc::new(provider), PlatformOrder::default())
        }

        /// Container using the standard schema and file storage.
        pub fn container(&self) -> ProfileSettingsContainer {
            let schema = self.properties().schema();
            ProfileSettingsContainer::new(Arc::new(self.persister()), Arc::new(schema)).unwrap()
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
    }

    impl Default for TestEnv {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Library-level error type for gradle-props operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Cannot decode {property}: {message}")]
    Decode { property: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Initial value cannot be set once listeners are registered")]
    ListenersAttached,

    #[error("Save queue has shut down")]
    SaveQueueClosed,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a decode error for the named property.
    pub fn decode(property: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Decode {
            property: property.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for gradle-props operations.
pub type Result<T> = std::result::Result<T, Error>;
