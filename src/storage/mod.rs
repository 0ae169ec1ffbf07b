//! Persistence of profile settings.
//!
//! - [`format`] - XML settings documents
//! - [`SettingsPersister`] - where documents live (`FilePersister`, `MemoryPersister`)
//! - [`SaveQueue`] - background writer behind `save()` / `save_and_wait()`

mod backend;
mod file;
pub mod format;
mod writer;

pub use backend::{MemoryPersister, SettingsPersister};
pub use file::{DEFAULT_PROFILE_FILE, FilePersister, PROFILES_DIR};
pub use format::{ConfigSaveOptions, LineSeparator};
pub use writer::{SaveJob, SaveQueue};

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Per-project directory for private profiles under `data_dir`.
///
/// Format: `<data_dir>/gradle-props/<first 12 hex chars of sha256(canonical project path)>`
pub fn private_storage_dir(project_dir: &Path, data_dir: &Path) -> Result<PathBuf> {
    let project_canonical = project_dir
        .canonicalize()
        .map_err(|e| Error::Other(format!("Could not canonicalize project path: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(project_canonical.to_string_lossy().as_bytes());
    let hash = hasher.finalize();
    let hash_hex = format!("{:x}", hash);
    let short_hash = &hash_hex[..12];

    Ok(data_dir.join("gradle-props").join(short_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_private_storage_dir_is_stable() {
        let env = TestEnv::new();
        let a = private_storage_dir(env.path(), env.data_path()).unwrap();
        let b = private_storage_dir(env.path(), env.data_path()).unwrap();
        assert_eq!(a, b);
        let hash = a.file_name().unwrap().to_str().unwrap();
        assert_eq!(hash.len(), 12);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_private_storage_dir_differs_per_project() {
        let one = TestEnv::new();
        let two = TestEnv::new();
        assert_ne!(
            private_storage_dir(one.path(), one.data_path()).unwrap(),
            private_storage_dir(two.path(), one.data_path()).unwrap()
        );
    }

    #[test]
    fn test_private_storage_dir_missing_project() {
        let env = TestEnv::new();
        let missing = env.path().join("nope");
        assert!(private_storage_dir(&missing, env.data_path()).is_err());
    }
}
