//! Active settings query.
//!
//! Resolves each property for the currently selected profile: the value
//! the selected profile stores is merged with the value of the default
//! profile using the property's merger, then turned into the consumer
//! value. Selecting another profile re-wires every property obtained
//! from the query; listeners are told only when a resolved value changed.

use std::sync::Arc;

use super::container::ProfileSettingsContainer;
use super::definition::PropertyDef;
use super::key::ProfileKey;
use super::profile::{ProfileSettings, SingleProfileSettingsEx};
use crate::Result;
use crate::property::{
    self, EditContext, MutableCell, MutableProperty, PropertySource, SharedSource,
};

pub struct ActiveSettingsQuery {
    selected: Arc<MutableCell<ProfileSettings>>,
    default_profile: ProfileSettings,
}

impl ActiveSettingsQuery {
    /// A query starting at `selected`, falling back to `default_profile`.
    pub fn new(selected: ProfileSettings, default_profile: ProfileSettings) -> Self {
        Self {
            selected: Arc::new(MutableCell::new(selected)),
            default_profile,
        }
    }

    /// A query selecting `key` in `container`.
    pub fn for_profile(container: &ProfileSettingsContainer, key: &ProfileKey) -> Result<Self> {
        Ok(Self::new(
            container.load_profile(key)?,
            container.default_profile()?,
        ))
    }

    pub fn default_profile(&self) -> &ProfileSettings {
        &self.default_profile
    }

    /// The merged, observable value of `def`.
    pub fn get_property<K, V>(&self, def: &Arc<PropertyDef<K, V>>) -> SharedSource<V>
    where
        K: Clone + Send + Sync + 'static,
        V: PartialEq + Send + Sync + 'static,
    {
        let to_value = def.clone();
        property::distinct(property::flat_map(
            self.merged_key(def),
            move |key: Option<K>| to_value.property(key),
        ))
    }

    /// The merged value key of `def`, before it becomes a value.
    pub fn merged_key<K, V>(&self, def: &Arc<PropertyDef<K, V>>) -> SharedSource<Option<K>>
    where
        K: Clone + Send + Sync + 'static,
        V: 'static,
    {
        let def = def.clone();
        let default_profile = self.default_profile.clone();
        let selected: SharedSource<ProfileSettings> = self.selected.clone();
        property::flat_map(selected, move |settings: ProfileSettings| {
            let parent = if settings == default_profile {
                None
            } else {
                Some(def.profile_source(&default_profile))
            };
            property::merged(def.profile_source(&settings), parent, def.merger().clone())
        })
    }

    /// The selected profile, observable.
    pub fn current_profile_settings(&self) -> SharedSource<ProfileSettings> {
        self.selected.clone()
    }

    /// The selected profile with its auxiliary-config operations, observable.
    pub fn current_profile_settings_ex(&self) -> SharedSource<Arc<dyn SingleProfileSettingsEx>> {
        property::map(self.current_profile_settings(), |settings| {
            Arc::new(settings) as Arc<dyn SingleProfileSettingsEx>
        })
    }

    /// Make `settings` the selected profile.
    pub fn select_profile(&self, ctx: &EditContext, settings: ProfileSettings) {
        tracing::debug!(profile = %settings.key(), "Selecting profile");
        self.selected.set_value(ctx, settings);
    }

    /// Whether the default profile is the one selected.
    pub fn is_default_selected(&self) -> bool {
        self.selected.value() == self.default_profile
    }
}

impl std::fmt::Debug for ActiveSettingsQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSettingsQuery")
            .field("selected", &self.selected.value())
            .finish()
    }
}
