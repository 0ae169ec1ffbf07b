//! Single-profile settings store.
//!
//! A [`ProfileSettings`] holds the settings tree of one profile, exposes
//! any node of it as an observable raw property, keeps auxiliary
//! (schema-unknown) elements intact, and writes the tree back through the
//! save queue.
//!
//! The tree is an immutable snapshot that edits replace wholesale, so
//! readers on other threads never observe a half-applied change.

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::definition::SettingsSchema;
use super::key::ProfileKey;
use crate::property::{
    EditContext, Listener, ListenerRef, ListenerRegistry, MutableProperty, PropertySource,
};
use crate::storage::format::{self, DocumentEntry};
use crate::storage::{ConfigSaveOptions, SaveJob, SaveQueue, SettingsPersister};
use crate::tree::{ConfigKey, ConfigPath, ConfigTree, equivalent, policy_at, sort_tree};
use crate::{Error, Result};

/// Settings of exactly one profile, without any merging.
pub trait SingleProfileSettings: Send + Sync {
    fn key(&self) -> &ProfileKey;

    /// The node at `path`, as an observable property. `None` when absent.
    fn raw_property(&self, path: &ConfigPath) -> Arc<dyn MutableProperty<Option<ConfigTree>>>;

    /// Write the profile and block until the write finished.
    ///
    /// Must not be called from a save job, which would wait on itself.
    fn save_and_wait(&self) -> Result<()>;
}

/// Auxiliary configuration and save options on top of [`SingleProfileSettings`].
pub trait SingleProfileSettingsEx: SingleProfileSettings {
    /// The top-level element `key`, unless a definition claims it.
    fn aux_config(&self, key: &ConfigKey) -> Option<AuxConfig>;

    /// Replace (or with `None`, remove) the auxiliary element `key`.
    fn set_aux_config(&self, ctx: &EditContext, key: &ConfigKey, config: Option<AuxConfig>);

    /// Keys of all auxiliary elements, in key order.
    fn aux_configs(&self) -> Vec<ConfigKey>;

    fn save_options(&self) -> ConfigSaveOptions;

    fn set_save_options(&self, ctx: &EditContext, options: ConfigSaveOptions);
}

/// An element the schema does not know, kept as found.
#[derive(Debug, Clone)]
pub struct AuxConfig {
    key: ConfigKey,
    tree: ConfigTree,
    xml: Option<String>,
}

impl AuxConfig {
    pub fn new(key: ConfigKey, tree: ConfigTree) -> Self {
        Self {
            key,
            tree,
            xml: None,
        }
    }

    /// Parse a standalone element, keeping its text for writing.
    ///
    /// Only the element itself is kept: a prolog or trailing whitespace is
    /// dropped, and text that cannot stand alone inside a settings file
    /// is replaced by the rendered tree.
    pub fn parse(xml: &str) -> Result<Self> {
        let (key, tree, xml) = format::parse_fragment(xml)?;
        Ok(Self { key, tree, xml })
    }

    pub fn key(&self) -> &ConfigKey {
        &self.key
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// The element as XML: the original text when there is one.
    pub fn to_xml(&self) -> String {
        match &self.xml {
            Some(xml) => xml.clone(),
            None => format::render_element(&self.key, &self.tree),
        }
    }
}

impl PartialEq for AuxConfig {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.tree == other.tree
    }
}

impl Eq for AuxConfig {}

/// Text of a top-level element and the tree it stood for.
#[derive(Debug, Clone)]
struct SourceText {
    tree: ConfigTree,
    text: String,
}

#[derive(Debug, Clone, Default)]
struct ProfileContent {
    root: ConfigTree,
    sources: BTreeMap<ConfigKey, SourceText>,
    options: ConfigSaveOptions,
}

struct Inner {
    key: ProfileKey,
    schema: Arc<SettingsSchema>,
    persister: Arc<dyn SettingsPersister>,
    queue: SaveQueue,
    content: ArcSwap<ProfileContent>,
    last_saved: Mutex<ConfigTree>,
    load_error: Mutex<Option<String>>,
    listeners: ListenerRegistry<ConfigPath>,
}

/// The settings store of one profile.
///
/// Cheap to clone; clones share the same store. Two handles are equal
/// when they refer to the same store.
#[derive(Clone)]
pub struct ProfileSettings {
    inner: Arc<Inner>,
}

impl ProfileSettings {
    /// Load `key` from `persister`.
    ///
    /// A missing document gives an empty profile. A document that cannot
    /// be parsed also gives an empty profile, logged, and refuses to be
    /// overwritten by [`save_and_wait`](Self::save_and_wait).
    pub fn load(
        key: ProfileKey,
        persister: Arc<dyn SettingsPersister>,
        schema: Arc<SettingsSchema>,
        queue: SaveQueue,
    ) -> Result<Self> {
        let text = persister.load(&key)?;
        let mut load_error = None;
        let document = match text.as_deref().map(format::parse_document) {
            None => format::ParsedDocument::default(),
            Some(Ok(document)) => document,
            Some(Err(e)) => {
                tracing::warn!(
                    profile = %key,
                    location = %persister.location(&key),
                    error = %e,
                    "Settings file is unreadable, starting with empty settings"
                );
                load_error = Some(e.to_string());
                format::ParsedDocument::default()
            }
        };

        let policy = schema.root_policy();
        let root = sort_tree(&document.root(), policy);
        let mut sources = BTreeMap::new();
        for node in document.nodes {
            if let Some(text) = node.text {
                let tree = sort_tree(&node.tree, policy.child_sorter(&node.key));
                sources.entry(node.key).or_insert(SourceText { tree, text });
            }
        }

        tracing::debug!(profile = %key, elements = root.child_count(), "Loaded profile settings");
        let last_saved = if text.is_some() {
            root.clone()
        } else {
            ConfigTree::empty()
        };
        Ok(Self {
            inner: Arc::new(Inner {
                key,
                schema,
                persister,
                queue,
                content: ArcSwap::from_pointee(ProfileContent {
                    root,
                    sources,
                    options: ConfigSaveOptions::new(document.line_separator),
                }),
                last_saved: Mutex::new(last_saved),
                load_error: Mutex::new(load_error),
                listeners: ListenerRegistry::new(),
            }),
        })
    }

    pub fn key(&self) -> &ProfileKey {
        &self.inner.key
    }

    pub fn schema(&self) -> &Arc<SettingsSchema> {
        &self.inner.schema
    }

    /// Snapshot of the whole settings tree.
    pub fn root(&self) -> ConfigTree {
        self.inner.content.load().root.clone()
    }

    /// Where the profile is stored.
    pub fn location(&self) -> String {
        self.inner.persister.location(&self.inner.key)
    }

    /// Why the stored document could not be read, if it could not.
    pub fn load_error(&self) -> Option<String> {
        self.inner.load_error.lock().clone()
    }

    /// Whether the tree differs from what was last loaded or written.
    pub fn is_modified(&self) -> bool {
        let root = self.root();
        !equivalent(&root, &self.inner.last_saved.lock(), self.inner.schema.root_policy())
    }

    /// Replace the node at `path` and notify listeners of overlapping paths.
    ///
    /// An empty node removes a setting the schema knows. Below an auxiliary
    /// element it is stored as given.
    pub fn set_node(&self, _ctx: &EditContext, path: &ConfigPath, node: Option<ConfigTree>) {
        let policy = policy_at(self.inner.schema.root_policy(), path);
        let keep_empty = path.first().is_some_and(|key| !self.inner.schema.knows(key));
        let node = node
            .filter(|n| keep_empty || !n.is_empty())
            .map(|n| sort_tree(&n, policy));
        let current = self.inner.content.load_full();
        let root = current.root.with_deep_child(path, node);
        if root == current.root {
            return;
        }
        self.inner.content.store(Arc::new(ProfileContent {
            root,
            ..(*current).clone()
        }));
        tracing::debug!(profile = %self.inner.key, path = %path, "Settings node changed");
        self.inner.listeners.fire_filtered(|p| p.overlaps(path));
    }

    /// Drop the remembered source text of schema elements so that the
    /// next save writes them in normalized form.
    pub fn discard_source_text(&self, _ctx: &EditContext) {
        let current = self.inner.content.load_full();
        let schema = &self.inner.schema;
        let sources = current
            .sources
            .iter()
            .filter(|(key, _)| !schema.knows(key))
            .map(|(key, source)| (key.clone(), source.clone()))
            .collect();
        self.inner.content.store(Arc::new(ProfileContent {
            sources,
            ..(*current).clone()
        }));
    }

    /// Queue a write of this profile without waiting.
    pub fn save(&self) -> Result<()> {
        self.inner.queue.submit(self.save_job(false))
    }

    /// Write even when nothing changed, or when the stored document
    /// could not be read.
    pub fn force_save_and_wait(&self) -> Result<()> {
        self.inner.queue.submit_and_wait(self.save_job(true))
    }

    /// The document that a save would write now.
    pub fn render(&self) -> String {
        render_content(&self.inner.content.load())
    }

    fn save_job(&self, force: bool) -> SaveJob {
        let settings = self.clone();
        Box::new(move || settings.write(force))
    }

    fn write(&self, force: bool) -> Result<()> {
        let inner = &self.inner;
        if !force {
            if let Some(error) = inner.load_error.lock().as_ref() {
                return Err(Error::InvalidInput(format!(
                    "Refusing to overwrite unreadable settings file {}: {}",
                    self.location(),
                    error
                )));
            }
        }

        let content = inner.content.load_full();
        let mut last_saved = inner.last_saved.lock();
        if !force && equivalent(&content.root, &last_saved, inner.schema.root_policy()) {
            tracing::debug!(profile = %inner.key, "Settings unchanged, skipping write");
            return Ok(());
        }

        let text = render_content(&content);
        inner.persister.store(&inner.key, &text)?;
        *last_saved = content.root.clone();
        *inner.load_error.lock() = None;
        tracing::debug!(profile = %inner.key, location = %self.location(), "Saved profile settings");
        Ok(())
    }
}

fn render_content(content: &ProfileContent) -> String {
    let entries = content.root.children().map(|(key, tree)| {
        match content.sources.get(key) {
            Some(source) if source.tree == *tree => DocumentEntry::Verbatim(&source.text),
            _ => DocumentEntry::Tree(key, tree),
        }
    });
    format::render_document(entries, content.options.line_separator())
}

impl PartialEq for ProfileSettings {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ProfileSettings {}

impl std::fmt::Debug for ProfileSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileSettings")
            .field("key", &self.inner.key)
            .finish()
    }
}

impl SingleProfileSettings for ProfileSettings {
    fn key(&self) -> &ProfileKey {
        &self.inner.key
    }

    fn raw_property(&self, path: &ConfigPath) -> Arc<dyn MutableProperty<Option<ConfigTree>>> {
        Arc::new(RawNodeProperty {
            settings: self.clone(),
            path: path.clone(),
        })
    }

    fn save_and_wait(&self) -> Result<()> {
        self.inner.queue.submit_and_wait(self.save_job(false))
    }
}

impl SingleProfileSettingsEx for ProfileSettings {
    fn aux_config(&self, key: &ConfigKey) -> Option<AuxConfig> {
        if self.inner.schema.knows(key) {
            return None;
        }
        let content = self.inner.content.load();
        let tree = content.root.find_child(key)?.clone();
        let xml = content
            .sources
            .get(key)
            .filter(|source| source.tree == tree)
            .map(|source| source.text.clone());
        Some(AuxConfig {
            key: key.clone(),
            tree,
            xml,
        })
    }

    fn set_aux_config(&self, ctx: &EditContext, key: &ConfigKey, config: Option<AuxConfig>) {
        let current = self.inner.content.load_full();
        let mut sources = current.sources.clone();
        sources.remove(key);
        let tree = config.map(|config| {
            if let (Some(xml), true) = (config.xml, config.key == *key) {
                sources.insert(
                    key.clone(),
                    SourceText {
                        tree: config.tree.clone(),
                        text: xml,
                    },
                );
            }
            config.tree
        });
        self.inner.content.store(Arc::new(ProfileContent {
            sources,
            ..(*current).clone()
        }));
        self.set_node(ctx, &ConfigPath::new(vec![key.clone()]), tree);
    }

    fn aux_configs(&self) -> Vec<ConfigKey> {
        let content = self.inner.content.load();
        let mut keys: Vec<ConfigKey> = Vec::new();
        for (key, _) in content.root.children() {
            if !self.inner.schema.knows(key) && !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    fn save_options(&self) -> ConfigSaveOptions {
        self.inner.content.load().options
    }

    fn set_save_options(&self, _ctx: &EditContext, options: ConfigSaveOptions) {
        let current = self.inner.content.load_full();
        self.inner.content.store(Arc::new(ProfileContent {
            options,
            ..(*current).clone()
        }));
    }
}

/// One node of a profile tree.
struct RawNodeProperty {
    settings: ProfileSettings,
    path: ConfigPath,
}

impl PropertySource<Option<ConfigTree>> for RawNodeProperty {
    fn value(&self) -> Option<ConfigTree> {
        self.settings
            .inner
            .content
            .load()
            .root
            .find_deep_child(&self.path)
            .cloned()
    }

    fn is_default(&self) -> bool {
        self.value().is_none()
    }

    fn add_change_listener(&self, listener: Listener) -> ListenerRef {
        self.settings
            .inner
            .listeners
            .register_with(self.path.clone(), listener)
    }
}

impl MutableProperty<Option<ConfigTree>> for RawNodeProperty {
    fn set_value(&self, ctx: &EditContext, value: Option<ConfigTree>) {
        self.settings.set_node(ctx, &self.path, value);
    }
}
