//! Persister trait and the in-memory implementation.
//!
//! Implementations:
//! - `FilePersister` - settings files in the project, private profiles per user
//! - `MemoryPersister` - in-process map, for tests and embedding

use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::Result;
use crate::settings::ProfileKey;

/// Raw storage of one settings document per profile.
///
/// Persisters only move text; parsing and rendering happen above them.
pub trait SettingsPersister: Send + Sync {
    /// Read the document of `key`. `None` when the profile has no document.
    fn load(&self, key: &ProfileKey) -> Result<Option<String>>;

    /// Replace the document of `key`.
    fn store(&self, key: &ProfileKey, text: &str) -> Result<()>;

    /// Delete the document of `key`. Returns whether one existed.
    fn remove(&self, key: &ProfileKey) -> Result<bool>;

    /// Named profiles that have a document.
    fn list_profiles(&self) -> Result<Vec<ProfileKey>>;

    /// Where the document of `key` lives (for display purposes).
    fn location(&self, key: &ProfileKey) -> String;
}

/// Keeps documents in memory.
#[derive(Debug, Default)]
pub struct MemoryPersister {
    documents: Mutex<BTreeMap<ProfileKey, String>>,
    writes: Mutex<usize>,
}

impl MemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document.
    pub fn with_document(self, key: ProfileKey, text: impl Into<String>) -> Self {
        self.documents.lock().insert(key, text.into());
        self
    }

    /// Current document of `key`.
    pub fn document(&self, key: &ProfileKey) -> Option<String> {
        self.documents.lock().get(key).cloned()
    }

    /// Number of `store` calls so far.
    pub fn write_count(&self) -> usize {
        *self.writes.lock()
    }
}

impl SettingsPersister for MemoryPersister {
    fn load(&self, key: &ProfileKey) -> Result<Option<String>> {
        Ok(self.document(key))
    }

    fn store(&self, key: &ProfileKey, text: &str) -> Result<()> {
        self.documents.lock().insert(key.clone(), text.to_string());
        *self.writes.lock() += 1;
        Ok(())
    }

    fn remove(&self, key: &ProfileKey) -> Result<bool> {
        Ok(self.documents.lock().remove(key).is_some())
    }

    fn list_profiles(&self) -> Result<Vec<ProfileKey>> {
        Ok(self
            .documents
            .lock()
            .keys()
            .filter(|k| !k.is_default())
            .cloned()
            .collect())
    }

    fn location(&self, key: &ProfileKey) -> String {
        format!("memory:{}", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_persister_round_trip() {
        let persister = MemoryPersister::new();
        let debug = ProfileKey::named("debug").unwrap();
        assert_eq!(persister.load(&debug).unwrap(), None);

        persister.store(&debug, "<gradle-props/>").unwrap();
        assert_eq!(persister.load(&debug).unwrap().as_deref(), Some("<gradle-props/>"));
        assert_eq!(persister.write_count(), 1);
        assert_eq!(persister.list_profiles().unwrap(), vec![debug.clone()]);

        assert!(persister.remove(&debug).unwrap());
        assert!(!persister.remove(&debug).unwrap());
    }

    #[test]
    fn test_memory_persister_lists_named_only() {
        let persister = MemoryPersister::new()
            .with_document(ProfileKey::Default, "<gradle-props/>")
            .with_document(ProfileKey::named("b").unwrap(), "<gradle-props/>")
            .with_document(ProfileKey::named("a").unwrap(), "<gradle-props/>");
        let names: Vec<String> = persister
            .list_profiles()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
