//! Profile settings container.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::definition::SettingsSchema;
use super::key::ProfileKey;
use super::profile::ProfileSettings;
use crate::storage::{SaveQueue, SettingsPersister};
use crate::{Error, Result};

/// Owns every loaded profile of one project.
///
/// Profiles are loaded on first use and cached, so asking twice for the
/// same key yields the same store.
pub struct ProfileSettingsContainer {
    persister: Arc<dyn SettingsPersister>,
    schema: Arc<SettingsSchema>,
    queue: SaveQueue,
    profiles: Mutex<BTreeMap<ProfileKey, ProfileSettings>>,
}

impl ProfileSettingsContainer {
    pub fn new(persister: Arc<dyn SettingsPersister>, schema: Arc<SettingsSchema>) -> Result<Self> {
        Ok(Self {
            persister,
            schema,
            queue: SaveQueue::start()?,
            profiles: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn schema(&self) -> &Arc<SettingsSchema> {
        &self.schema
    }

    pub fn persister(&self) -> &Arc<dyn SettingsPersister> {
        &self.persister
    }

    /// The store of `key`, loading it if needed.
    pub fn load_profile(&self, key: &ProfileKey) -> Result<ProfileSettings> {
        let mut profiles = self.profiles.lock();
        if let Some(settings) = profiles.get(key) {
            return Ok(settings.clone());
        }
        let settings = ProfileSettings::load(
            key.clone(),
            self.persister.clone(),
            self.schema.clone(),
            self.queue.clone(),
        )?;
        profiles.insert(key.clone(), settings.clone());
        Ok(settings)
    }

    pub fn default_profile(&self) -> Result<ProfileSettings> {
        self.load_profile(&ProfileKey::Default)
    }

    /// The default profile followed by every stored named profile.
    pub fn available_profiles(&self) -> Result<Vec<ProfileKey>> {
        let mut keys = vec![ProfileKey::Default];
        keys.extend(
            self.persister
                .list_profiles()?
                .into_iter()
                .filter(|k| !k.is_default()),
        );
        Ok(keys)
    }

    /// Delete a named profile. Returns whether it had a document.
    pub fn remove_profile(&self, key: &ProfileKey) -> Result<bool> {
        if key.is_default() {
            return Err(Error::InvalidInput(
                "The default profile cannot be removed".to_string(),
            ));
        }
        self.profiles.lock().remove(key);
        let removed = self.persister.remove(key)?;
        tracing::debug!(profile = %key, removed, "Removed profile");
        Ok(removed)
    }
}

impl std::fmt::Debug for ProfileSettingsContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileSettingsContainer")
            .field("schema", &self.schema)
            .field("loaded", &self.profiles.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}
