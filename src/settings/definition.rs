//! Property definitions.
//!
//! A [`PropertyDef<K, V>`] describes one setting:
//!
//! - where it lives in a settings file ([`ConfigPath`]),
//! - how the node there is decoded into a *value key* `K` and back
//!   ([`KeyEncoding`]),
//! - how profile levels are merged on `K` ([`ValueMerger`]),
//! - how a merged key becomes the observable value `V` ([`ValueDef`]),
//! - and optionally how the node is ordered on save ([`ConfigNodeProperty`]).
//!
//! `K` is what gets stored; `V` is what consumers see. They are often the
//! same type, but need not be: a platform is stored as a name/version pair
//! and consumed as the installed platform that best matches it.

use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use super::merge::{ChildOverrides, ValueMerger};
use super::profile::SingleProfileSettings;
use crate::property::{
    ConstProperty, EditContext, Listener, ListenerRef, MutableProperty, PropertySource,
    SharedSource,
};
use crate::tree::{
    ConfigKey, ConfigNodeProperty, ConfigPath, ConfigTree, DefaultNodeProperty, KeyedNodeProperty,
    KeyedNodePropertyBuilder, PreservedNodeProperty,
};
use crate::{Error, Result};

/// Converts between a settings node and a value key.
pub trait KeyEncoding<K>: Send + Sync {
    /// Decode a present node. `Ok(None)` means "nothing set".
    fn decode(&self, node: &ConfigTree) -> Result<Option<K>>;

    /// Encode a key into a node.
    fn encode(&self, key: &K) -> ConfigTree;
}

/// Turns a merged value key into an observable value.
pub trait ValueDef<K, V>: Send + Sync {
    /// Source of the value for `key`; `None` asks for the default.
    fn property(&self, key: Option<K>) -> SharedSource<V>;

    /// The key that would produce `value`.
    fn key_from_value(&self, value: &V) -> Option<K>;
}

/// Text value parsed with `FromStr` and written with `Display`.
pub struct TextEncoding<T>(PhantomData<fn() -> T>);

impl<T> TextEncoding<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for TextEncoding<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> KeyEncoding<T> for TextEncoding<T>
where
    T: FromStr + ToString,
    T::Err: std::fmt::Display,
{
    fn decode(&self, node: &ConfigTree) -> Result<Option<T>> {
        match node.value() {
            None => Ok(None),
            Some(text) => text
                .parse()
                .map(Some)
                .map_err(|e: T::Err| Error::decode(text, e.to_string())),
        }
    }

    fn encode(&self, key: &T) -> ConfigTree {
        ConfigTree::leaf(key.to_string())
    }
}

/// A list of strings stored as repeated child elements.
pub struct StringListEncoding {
    item: ConfigKey,
}

impl StringListEncoding {
    pub fn new(item_name: &str) -> Self {
        Self {
            item: ConfigKey::new(item_name),
        }
    }
}

impl KeyEncoding<Vec<String>> for StringListEncoding {
    fn decode(&self, node: &ConfigTree) -> Result<Option<Vec<String>>> {
        let items: Vec<String> = node
            .children_named(&self.item)
            .filter_map(|c| c.value().map(str::to_string))
            .collect();
        Ok(Some(items))
    }

    fn encode(&self, key: &Vec<String>) -> ConfigTree {
        key.iter()
            .fold(ConfigTree::builder(), |b, item| {
                b.child(self.item.clone(), ConfigTree::leaf(item.clone()))
            })
            .build()
    }
}

/// The node itself is the key (XML fragments).
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeEncoding;

impl KeyEncoding<ConfigTree> for TreeEncoding {
    fn decode(&self, node: &ConfigTree) -> Result<Option<ConfigTree>> {
        Ok(Some(node.clone()))
    }

    fn encode(&self, key: &ConfigTree) -> ConfigTree {
        key.clone()
    }
}

/// Encoding built from two functions.
pub struct FnEncoding<K> {
    decode: Box<dyn Fn(&ConfigTree) -> Result<Option<K>> + Send + Sync>,
    encode: Box<dyn Fn(&K) -> ConfigTree + Send + Sync>,
}

impl<K> FnEncoding<K> {
    pub fn new(
        decode: impl Fn(&ConfigTree) -> Result<Option<K>> + Send + Sync + 'static,
        encode: impl Fn(&K) -> ConfigTree + Send + Sync + 'static,
    ) -> Self {
        Self {
            decode: Box::new(decode),
            encode: Box::new(encode),
        }
    }
}

impl<K> KeyEncoding<K> for FnEncoding<K> {
    fn decode(&self, node: &ConfigTree) -> Result<Option<K>> {
        (self.decode)(node)
    }

    fn encode(&self, key: &K) -> ConfigTree {
        (self.encode)(key)
    }
}

/// `V = K`, with a fixed default.
pub struct DefaultedValueDef<K> {
    default: K,
}

impl<K> DefaultedValueDef<K> {
    pub fn new(default: K) -> Self {
        Self { default }
    }
}

impl<K: Clone + Send + Sync + 'static> ValueDef<K, K> for DefaultedValueDef<K> {
    fn property(&self, key: Option<K>) -> SharedSource<K> {
        match key {
            Some(key) => Arc::new(ConstProperty::of(key)),
            None => Arc::new(ConstProperty::default_of(self.default.clone())),
        }
    }

    fn key_from_value(&self, value: &K) -> Option<K> {
        Some(value.clone())
    }
}

/// `V = Option<K>`: no value unless some profile sets one.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalValueDef;

impl<K: Clone + Send + Sync + 'static> ValueDef<K, Option<K>> for OptionalValueDef {
    fn property(&self, key: Option<K>) -> SharedSource<Option<K>> {
        match key {
            Some(key) => Arc::new(ConstProperty::of(Some(key))),
            None => Arc::new(ConstProperty::default_of(None)),
        }
    }

    fn key_from_value(&self, value: &Option<K>) -> Option<K> {
        value.clone()
    }
}

/// A schema entry for one setting.
pub struct PropertyDef<K, V> {
    name: String,
    path: ConfigPath,
    encoding: Arc<dyn KeyEncoding<K>>,
    value_def: Arc<dyn ValueDef<K, V>>,
    merger: Arc<dyn ValueMerger<K>>,
    node_property: Option<Arc<dyn ConfigNodeProperty>>,
}

impl<K, V> PropertyDef<K, V>
where
    K: Clone + Send + Sync + 'static,
    V: 'static,
{
    /// A definition with the child-overrides merger and default node policy.
    pub fn new(
        name: impl Into<String>,
        path: ConfigPath,
        encoding: Arc<dyn KeyEncoding<K>>,
        value_def: Arc<dyn ValueDef<K, V>>,
    ) -> Self {
        Self {
            name: name.into(),
            path,
            encoding,
            value_def,
            merger: Arc::new(ChildOverrides),
            node_property: None,
        }
    }

    pub fn with_merger(mut self, merger: Arc<dyn ValueMerger<K>>) -> Self {
        self.merger = merger;
        self
    }

    pub fn with_node_property(mut self, policy: Arc<dyn ConfigNodeProperty>) -> Self {
        self.node_property = Some(policy);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &ConfigPath {
        &self.path
    }

    pub fn encoding(&self) -> &Arc<dyn KeyEncoding<K>> {
        &self.encoding
    }

    pub fn value_def(&self) -> &Arc<dyn ValueDef<K, V>> {
        &self.value_def
    }

    pub fn merger(&self) -> &Arc<dyn ValueMerger<K>> {
        &self.merger
    }

    pub fn node_property(&self) -> Option<&Arc<dyn ConfigNodeProperty>> {
        self.node_property.as_ref()
    }

    /// Source of the value for `key` (see [`ValueDef::property`]).
    pub fn property(&self, key: Option<K>) -> SharedSource<V> {
        self.value_def.property(key)
    }

    /// Decode a node, reporting failures.
    pub fn decode(&self, node: &ConfigTree) -> Result<Option<K>> {
        self.encoding.decode(node).map_err(|e| match e {
            Error::Decode { message, .. } => Error::decode(&self.name, message),
            other => Error::decode(&self.name, other.to_string()),
        })
    }

    /// Decode a node, falling back to "not set" on failure.
    pub fn decode_or_default(&self, node: &ConfigTree) -> Option<K> {
        match self.decode(node) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(property = %self.name, error = %e, "Ignoring undecodable setting");
                None
            }
        }
    }

    pub fn encode(&self, key: &K) -> ConfigTree {
        self.encoding.encode(key)
    }

    /// This setting as stored in one profile, without merging.
    pub fn profile_property(
        self: &Arc<Self>,
        settings: &dyn SingleProfileSettings,
    ) -> Arc<dyn MutableProperty<Option<K>>> {
        Arc::new(ProfileProperty {
            def: self.clone(),
            raw: settings.raw_property(&self.path),
        })
    }

    /// Read-only form of [`profile_property`](Self::profile_property).
    pub fn profile_source(
        self: &Arc<Self>,
        settings: &dyn SingleProfileSettings,
    ) -> SharedSource<Option<K>> {
        Arc::new(ProfileProperty {
            def: self.clone(),
            raw: settings.raw_property(&self.path),
        })
    }
}

impl<K, V> std::fmt::Debug for PropertyDef<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyDef")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

/// Decoded view of a raw node in one profile.
struct ProfileProperty<K, V> {
    def: Arc<PropertyDef<K, V>>,
    raw: Arc<dyn MutableProperty<Option<ConfigTree>>>,
}

impl<K, V> PropertySource<Option<K>> for ProfileProperty<K, V>
where
    K: Clone + Send + Sync + 'static,
    V: 'static,
{
    fn value(&self) -> Option<K> {
        self.raw
            .value()
            .and_then(|node| self.def.decode_or_default(&node))
    }

    fn is_default(&self) -> bool {
        self.value().is_none()
    }

    fn add_change_listener(&self, listener: Listener) -> ListenerRef {
        self.raw.add_change_listener(listener)
    }
}

impl<K, V> MutableProperty<Option<K>> for ProfileProperty<K, V>
where
    K: Clone + Send + Sync + 'static,
    V: 'static,
{
    fn set_value(&self, ctx: &EditContext, value: Option<K>) {
        self.raw
            .set_value(ctx, value.map(|key| self.def.encode(&key)));
    }
}

/// The set of registered settings.
///
/// Knows which top-level elements belong to some definition (everything
/// else is auxiliary) and holds the save-time policy for the whole file.
pub struct SettingsSchema {
    root: KeyedNodeProperty,
    names: Vec<String>,
}

impl SettingsSchema {
    pub fn builder() -> SettingsSchemaBuilder {
        SettingsSchemaBuilder {
            root: KeyedNodeProperty::builder().unknown(Arc::new(PreservedNodeProperty)),
            names: Vec::new(),
        }
    }

    /// A schema without definitions: every element is auxiliary.
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Policy for the root element of a settings file.
    pub fn root_policy(&self) -> &dyn ConfigNodeProperty {
        &self.root
    }

    /// Whether the top-level element `key` belongs to a definition.
    pub fn knows(&self, key: &ConfigKey) -> bool {
        self.root.knows(key)
    }

    /// Top-level elements claimed by definitions.
    pub fn known_keys(&self) -> impl Iterator<Item = &ConfigKey> {
        self.root.known_keys()
    }

    /// Names of the registered definitions, in registration order.
    pub fn property_names(&self) -> &[String] {
        &self.names
    }
}

impl std::fmt::Debug for SettingsSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsSchema")
            .field("properties", &self.names)
            .finish()
    }
}

pub struct SettingsSchemaBuilder {
    root: KeyedNodePropertyBuilder,
    names: Vec<String>,
}

impl SettingsSchemaBuilder {
    /// Claim the path of `def`.
    pub fn register<K, V>(mut self, def: &PropertyDef<K, V>) -> Self
    where
        K: Clone + Send + Sync + 'static,
        V: 'static,
    {
        let policy = def
            .node_property()
            .cloned()
            .unwrap_or_else(|| Arc::new(DefaultNodeProperty));
        self.root = self.root.path(def.path(), policy);
        self.names.push(def.name().to_string());
        self
    }

    pub fn build(self) -> SettingsSchema {
        SettingsSchema {
            root: self.root.build(),
            names: self.names,
        }
    }
}
