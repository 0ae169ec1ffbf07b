//! Profile editors.
//!
//! An editor sits between a profile store and whatever presents the
//! settings to a user. Each editable setting has a *form field*, a
//! [`MutableCell`] standing in for an input widget. Editors hand out
//! [`StoredSettings`] snapshots:
//!
//! - [`ProfileEditor::read_from_settings`] captures what the profile stores,
//! - [`ProfileEditor::read_from_gui`] captures what the form fields hold.
//!
//! A snapshot can be pushed into the form ([`StoredSettings::display_settings`])
//! or into the profile ([`StoredSettings::save_settings`]).

use std::sync::Arc;

use super::definition::PropertyDef;
use super::profile::{ProfileSettings, SingleProfileSettings};
use super::query::ActiveSettingsQuery;
use crate::Result;
use crate::property::{EditContext, MutableCell, MutableProperty, PropertySource, SharedSource};

/// A captured set of setting values.
pub trait StoredSettings: Send + Sync {
    /// Show the captured values in the form.
    fn display_settings(&self, ctx: &EditContext);

    /// Store the captured values in the profile and persist them.
    fn save_settings(&self, ctx: &EditContext) -> Result<()>;
}

/// Placeholder for "no profile loaded yet". Using it is a bug and panics.
#[derive(Debug, Clone, Copy)]
pub struct NotInitialized;

pub static NOT_INITIALIZED: NotInitialized = NotInitialized;

impl StoredSettings for NotInitialized {
    fn display_settings(&self, _ctx: &EditContext) {
        panic!("display_settings called before any profile was loaded");
    }

    fn save_settings(&self, _ctx: &EditContext) -> Result<()> {
        panic!("save_settings called before any profile was loaded");
    }
}

/// Editor of (part of) one profile.
pub trait ProfileEditor: Send + Sync {
    fn read_from_settings(&self) -> Box<dyn StoredSettings>;

    fn read_from_gui(&self) -> Box<dyn StoredSettings>;
}

/// Creates editors for a profile.
pub trait ProfileEditorFactory: Send + Sync {
    fn start_editing_profile(
        &self,
        settings: &ProfileSettings,
        query: &ActiveSettingsQuery,
    ) -> Box<dyn ProfileEditor>;
}

impl<F> ProfileEditorFactory for F
where
    F: Fn(&ProfileSettings, &ActiveSettingsQuery) -> Box<dyn ProfileEditor> + Send + Sync,
{
    fn start_editing_profile(
        &self,
        settings: &ProfileSettings,
        query: &ActiveSettingsQuery,
    ) -> Box<dyn ProfileEditor> {
        self(settings, query)
    }
}

/// Edits the value one profile stores for one property.
///
/// The form field holds the profile's own value key; `None` means "not
/// set here", so the merged value comes from the default profile.
pub struct PropertyEditor<K, V> {
    field: Arc<MutableCell<Option<K>>>,
    stored: Arc<dyn MutableProperty<Option<K>>>,
    effective: SharedSource<V>,
}

impl<K, V> PropertyEditor<K, V>
where
    K: Clone + PartialEq + Send + Sync + 'static,
    V: PartialEq + Send + Sync + 'static,
{
    pub fn new(
        def: &Arc<PropertyDef<K, V>>,
        settings: &ProfileSettings,
        query: &ActiveSettingsQuery,
    ) -> Self {
        Self {
            field: Arc::new(MutableCell::new(None)),
            stored: def.profile_property(settings),
            effective: query.get_property(def),
        }
    }

    /// The form field.
    pub fn field(&self) -> &Arc<MutableCell<Option<K>>> {
        &self.field
    }

    /// The merged value for the selected profile, for display next to the field.
    pub fn effective(&self) -> &SharedSource<V> {
        &self.effective
    }
}

struct PropertySnapshot<K> {
    value: Option<K>,
    field: Arc<MutableCell<Option<K>>>,
    stored: Arc<dyn MutableProperty<Option<K>>>,
}

impl<K> StoredSettings for PropertySnapshot<K>
where
    K: Clone + PartialEq + Send + Sync + 'static,
{
    fn display_settings(&self, ctx: &EditContext) {
        self.field.set_value(ctx, self.value.clone());
    }

    /// Only updates the profile; persisting is up to [`ProfileSettingsEditor`].
    fn save_settings(&self, ctx: &EditContext) -> Result<()> {
        self.stored.set_value(ctx, self.value.clone());
        Ok(())
    }
}

impl<K, V> ProfileEditor for PropertyEditor<K, V>
where
    K: Clone + PartialEq + Send + Sync + 'static,
    V: PartialEq + Send + Sync + 'static,
{
    fn read_from_settings(&self) -> Box<dyn StoredSettings> {
        Box::new(PropertySnapshot {
            value: self.stored.value(),
            field: self.field.clone(),
            stored: self.stored.clone(),
        })
    }

    fn read_from_gui(&self) -> Box<dyn StoredSettings> {
        Box::new(PropertySnapshot {
            value: self.field.value(),
            field: self.field.clone(),
            stored: self.stored.clone(),
        })
    }
}

/// A [`ProfileEditorFactory`] for a single property.
pub struct PropertyEditorFactory<K, V> {
    def: Arc<PropertyDef<K, V>>,
}

impl<K, V> PropertyEditorFactory<K, V> {
    pub fn new(def: Arc<PropertyDef<K, V>>) -> Self {
        Self { def }
    }
}

impl<K, V> ProfileEditorFactory for PropertyEditorFactory<K, V>
where
    K: Clone + PartialEq + Send + Sync + 'static,
    V: PartialEq + Send + Sync + 'static,
{
    fn start_editing_profile(
        &self,
        settings: &ProfileSettings,
        query: &ActiveSettingsQuery,
    ) -> Box<dyn ProfileEditor> {
        Box::new(PropertyEditor::new(&self.def, settings, query))
    }
}

/// Edits a whole profile through a set of part editors.
///
/// Saving stores every part and then writes the profile once.
pub struct ProfileSettingsEditor {
    settings: ProfileSettings,
    parts: Vec<Box<dyn ProfileEditor>>,
}

impl ProfileSettingsEditor {
    pub fn new(settings: ProfileSettings, parts: Vec<Box<dyn ProfileEditor>>) -> Self {
        Self { settings, parts }
    }

    pub fn settings(&self) -> &ProfileSettings {
        &self.settings
    }
}

struct ProfileSnapshot {
    settings: ProfileSettings,
    parts: Vec<Box<dyn StoredSettings>>,
}

impl StoredSettings for ProfileSnapshot {
    fn display_settings(&self, ctx: &EditContext) {
        for part in &self.parts {
            part.display_settings(ctx);
        }
    }

    fn save_settings(&self, ctx: &EditContext) -> Result<()> {
        for part in &self.parts {
            part.save_settings(ctx)?;
        }
        self.settings.save_and_wait()
    }
}

impl ProfileEditor for ProfileSettingsEditor {
    fn read_from_settings(&self) -> Box<dyn StoredSettings> {
        Box::new(ProfileSnapshot {
            settings: self.settings.clone(),
            parts: self.parts.iter().map(|p| p.read_from_settings()).collect(),
        })
    }

    fn read_from_gui(&self) -> Box<dyn StoredSettings> {
        Box::new(ProfileSnapshot {
            settings: self.settings.clone(),
            parts: self.parts.iter().map(|p| p.read_from_gui()).collect(),
        })
    }
}

/// Combines factories into one that edits whole profiles.
#[derive(Default)]
pub struct CompositeEditorFactory {
    factories: Vec<Arc<dyn ProfileEditorFactory>>,
}

impl CompositeEditorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, factory: Arc<dyn ProfileEditorFactory>) -> Self {
        self.factories.push(factory);
        self
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl ProfileEditorFactory for CompositeEditorFactory {
    fn start_editing_profile(
        &self,
        settings: &ProfileSettings,
        query: &ActiveSettingsQuery,
    ) -> Box<dyn ProfileEditor> {
        let parts = self
            .factories
            .iter()
            .map(|f| f.start_editing_profile(settings, query))
            .collect();
        Box::new(ProfileSettingsEditor::new(settings.clone(), parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ProfileSettingsContainer;
    use crate::settings::ProfileKey;
    use crate::settings::definition::{OptionalValueDef, SettingsSchema, TextEncoding};
    use crate::storage::MemoryPersister;
    use crate::tree::ConfigPath;

    fn timeout() -> Arc<PropertyDef<u32, Option<u32>>> {
        Arc::new(PropertyDef::new(
            "daemon-timeout",
            ConfigPath::parse("gradle-daemon/timeout"),
            Arc::new(TextEncoding::<u32>::new()),
            Arc::new(OptionalValueDef),
        ))
    }

    fn setup(document: &str) -> (Arc<MemoryPersister>, ProfileSettingsContainer) {
        let persister = Arc::new(
            MemoryPersister::new().with_document(ProfileKey::named("debug").unwrap(), document),
        );
        let schema = SettingsSchema::builder().register(&timeout()).build();
        let container = ProfileSettingsContainer::new(persister.clone(), Arc::new(schema)).unwrap();
        (persister, container)
    }

    const DEBUG: &str =
        "<gradle-props><gradle-daemon><timeout>30</timeout></gradle-daemon></gradle-props>";

    // ==================== Sentinel Tests ====================

    #[test]
    #[should_panic(expected = "before any profile was loaded")]
    fn test_not_initialized_display_panics() {
        let ctx = EditContext::enter();
        NOT_INITIALIZED.display_settings(&ctx);
    }

    #[test]
    #[should_panic(expected = "before any profile was loaded")]
    fn test_not_initialized_save_panics() {
        let ctx = EditContext::enter();
        let _ = NOT_INITIALIZED.save_settings(&ctx);
    }

    // ==================== Editor Tests ====================

    #[test]
    fn test_display_then_edit_then_save() {
        let (persister, container) = setup(DEBUG);
        let key = ProfileKey::named("debug").unwrap();
        let settings = container.load_profile(&key).unwrap();
        let query = ActiveSettingsQuery::for_profile(&container, &key).unwrap();

        let def = timeout();
        let editor = PropertyEditor::new(&def, &settings, &query);
        let field = editor.field().clone();
        let profile_editor = ProfileSettingsEditor::new(
            settings.clone(),
            vec![Box::new(editor) as Box<dyn ProfileEditor>],
        );

        let ctx = EditContext::enter();
        profile_editor.read_from_settings().display_settings(&ctx);
        assert_eq!(field.value(), Some(30));

        field.set_value(&ctx, Some(10));
        assert_eq!(def.profile_source(&settings).value(), Some(30));

        profile_editor.read_from_gui().save_settings(&ctx).unwrap();
        assert_eq!(def.profile_source(&settings).value(), Some(10));
        assert_eq!(query.get_property(&def).value(), Some(10));
        assert!(
            persister
                .document(&key)
                .unwrap()
                .contains("<timeout>10</timeout>")
        );
    }

    #[test]
    fn test_snapshot_is_frozen() {
        let (_, container) = setup(DEBUG);
        let key = ProfileKey::named("debug").unwrap();
        let settings = container.load_profile(&key).unwrap();
        let query = ActiveSettingsQuery::for_profile(&container, &key).unwrap();
        let editor = PropertyEditor::new(&timeout(), &settings, &query);

        let ctx = EditContext::enter();
        let snapshot = editor.read_from_gui();
        editor.field().set_value(&ctx, Some(99));
        snapshot.display_settings(&ctx);
        assert_eq!(editor.field().value(), None);
    }

    #[test]
    fn test_composite_factory() {
        let (_, container) = setup(DEBUG);
        let key = ProfileKey::named("debug").unwrap();
        let settings = container.load_profile(&key).unwrap();
        let query = ActiveSettingsQuery::for_profile(&container, &key).unwrap();

        let factory = CompositeEditorFactory::new()
            .with(Arc::new(PropertyEditorFactory::new(timeout())))
            .with(Arc::new(
                |settings: &ProfileSettings, query: &ActiveSettingsQuery| {
                    Box::new(PropertyEditor::new(&timeout(), settings, query))
                        as Box<dyn ProfileEditor>
                },
            ));
        assert_eq!(factory.len(), 2);

        let editor = factory.start_editing_profile(&settings, &query);
        let ctx = EditContext::enter();
        // Saving unchanged settings leaves the profile as it was.
        editor.read_from_settings().save_settings(&ctx).unwrap();
        assert_eq!(timeout().profile_source(&settings).value(), Some(30));
    }
}
