//! Settings files on disk.
//!
//! Layout:
//! - `<project>/gradle-props.xml` - default profile
//! - `<project>/.gradle-props/profiles/<name>.xml` - named profile
//! - `<project>/.gradle-props/profiles/<group>/<name>.xml` - grouped profile
//! - `<data-dir>/gradle-props/<hash>/profiles/<name>.xml` - `private/<name>`

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::SettingsPersister;
use super::private_storage_dir;
use crate::settings::{PRIVATE_GROUP, ProfileKey};
use crate::{Error, Result};

/// File name of the default profile, in the project root.
pub const DEFAULT_PROFILE_FILE: &str = "gradle-props.xml";
/// Directory of named profiles, relative to the project root.
pub const PROFILES_DIR: &str = ".gradle-props/profiles";

const EXTENSION: &str = "xml";

/// Stores each profile in its own XML file.
#[derive(Debug, Clone)]
pub struct FilePersister {
    project_dir: PathBuf,
    private_dir: Option<PathBuf>,
}

impl FilePersister {
    /// Persister for `project_dir`, private profiles under the user data directory.
    pub fn new(project_dir: &Path) -> Result<Self> {
        let private_dir = match dirs::data_dir() {
            Some(data_dir) => Some(private_storage_dir(project_dir, &data_dir)?),
            None => None,
        };
        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            private_dir,
        })
    }

    /// Persister for `project_dir`, private profiles under `data_dir`.
    pub fn with_data_dir(project_dir: &Path, data_dir: &Path) -> Result<Self> {
        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            private_dir: Some(private_storage_dir(project_dir, data_dir)?),
        })
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// File holding the profile `key`.
    pub fn path_for(&self, key: &ProfileKey) -> Result<PathBuf> {
        let file_name = |name: &str| format!("{}.{}", name, EXTENSION);
        match key {
            ProfileKey::Default => Ok(self.project_dir.join(DEFAULT_PROFILE_FILE)),
            ProfileKey::Named { group: None, name } => {
                Ok(self.project_dir.join(PROFILES_DIR).join(file_name(name)))
            }
            ProfileKey::Named {
                group: Some(group),
                name,
            } if group == PRIVATE_GROUP => {
                let dir = self.private_dir.as_ref().ok_or_else(|| {
                    Error::Other("Could not determine data directory for private profiles".to_string())
                })?;
                Ok(dir.join("profiles").join(file_name(name)))
            }
            ProfileKey::Named {
                group: Some(group),
                name,
            } => Ok(self
                .project_dir
                .join(PROFILES_DIR)
                .join(group)
                .join(file_name(name))),
        }
    }
}

/// Profile names of the `*.xml` files directly in `dir`.
fn profile_names(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == EXTENSION) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    Ok(names)
}

fn collect_keys(names: Vec<String>, make: impl Fn(&str) -> Result<ProfileKey>) -> Vec<ProfileKey> {
    names
        .iter()
        .filter_map(|name| match make(name) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::debug!(name = %name, error = %e, "Skipping file with invalid profile name");
                None
            }
        })
        .collect()
}

impl SettingsPersister for FilePersister {
    fn load(&self, key: &ProfileKey) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, key: &ProfileKey, text: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let parent = path
            .parent()
            .ok_or_else(|| Error::Other(format!("No parent directory for {}", path.display())))?;
        std::fs::create_dir_all(parent)?;

        let mut file = NamedTempFile::new_in(parent)?;
        file.write_all(text.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!(profile = %key, path = %path.display(), "Wrote settings file");
        Ok(())
    }

    fn remove(&self, key: &ProfileKey) -> Result<bool> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_profiles(&self) -> Result<Vec<ProfileKey>> {
        let profiles_dir = self.project_dir.join(PROFILES_DIR);
        let mut keys = collect_keys(profile_names(&profiles_dir)?, ProfileKey::named);

        if profiles_dir.is_dir() {
            for entry in std::fs::read_dir(&profiles_dir)? {
                let path = entry?.path();
                if !path.is_dir() {
                    continue;
                }
                let Some(group) = path.file_name().and_then(|s| s.to_str()) else {
                    continue;
                };
                if group == PRIVATE_GROUP {
                    continue;
                }
                let group = group.to_string();
                keys.extend(collect_keys(profile_names(&path)?, |name| {
                    ProfileKey::in_group(&group, name)
                }));
            }
        }

        if let Some(private_dir) = &self.private_dir {
            keys.extend(collect_keys(
                profile_names(&private_dir.join("profiles"))?,
                ProfileKey::private,
            ));
        }

        keys.sort();
        Ok(keys)
    }

    fn location(&self, key: &ProfileKey) -> String {
        match self.path_for(key) {
            Ok(path) => path.display().to_string(),
            Err(_) => format!("<unavailable: {}>", key),
        }
    }
}
