//! Immutable configuration trees.
//!
//! A [`ConfigTree`] is the in-memory form of one XML element of a settings
//! file: an optional text value, attributes, and an ordered list of keyed
//! children. Trees are shared through `Arc` and never change after they are
//! built; every "modification" returns a new tree that shares the untouched
//! subtrees with the old one.

pub mod sorter;

pub use sorter::{
    ConfigNodeProperty, DEFAULT_NODE_PROPERTY, DefaultNodeProperty, KeyedNodeProperty,
    KeyedNodePropertyBuilder, ORDERED_NODE_PROPERTY, OrderedNodeProperty, PRESERVED_NODE_PROPERTY,
    PreservedNodeProperty, equivalent, policy_at, sort_tree,
};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Name of a tree node: element name plus optional namespace URI.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigKey {
    name: String,
    namespace: Option<String>,
}

/// Identity of a raw configuration fragment.
pub type DomElementKey = ConfigKey;

impl ConfigKey {
    /// A key without namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    /// A key in the namespace `namespace`.
    pub fn with_namespace(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Parse `name` or Clark notation `{namespace}name`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix('{') {
            let (namespace, name) = rest.split_once('}')?;
            if name.is_empty() || namespace.is_empty() {
                return None;
            }
            Some(Self::with_namespace(name, namespace))
        } else if s.is_empty() {
            None
        } else {
            Some(Self::new(s))
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A path of keys from the root of a settings file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ConfigPath {
    keys: Vec<ConfigKey>,
}

impl ConfigPath {
    /// The empty path, naming the root itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(keys: Vec<ConfigKey>) -> Self {
        Self { keys }
    }

    /// Parse a `/`-separated path of plain element names.
    pub fn parse(s: &str) -> Self {
        Self {
            keys: s
                .split('/')
                .filter(|part| !part.is_empty())
                .map(ConfigKey::new)
                .collect(),
        }
    }

    pub fn keys(&self) -> &[ConfigKey] {
        &self.keys
    }

    pub fn first(&self) -> Option<&ConfigKey> {
        self.keys.first()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// This path extended by `key`.
    pub fn child(&self, key: ConfigKey) -> Self {
        let mut keys = self.keys.clone();
        keys.push(key);
        Self { keys }
    }

    /// Whether one of the two paths is a prefix of the other.
    pub fn overlaps(&self, other: &ConfigPath) -> bool {
        self.keys.iter().zip(other.keys.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct TreeNode {
    value: Option<String>,
    attributes: BTreeMap<String, String>,
    children: Vec<(ConfigKey, ConfigTree)>,
}

static EMPTY_TREE: LazyLock<ConfigTree> = LazyLock::new(|| ConfigTree(Arc::default()));

/// An immutable configuration node.
///
/// Equality is structural: two trees are equal when their values,
/// attributes, and children (in order) are equal.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfigTree(Arc<TreeNode>);

impl Default for ConfigTree {
    fn default() -> Self {
        EMPTY_TREE.clone()
    }
}

impl ConfigTree {
    /// A tree with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A tree holding only `value`.
    pub fn leaf(value: impl Into<String>) -> Self {
        Self::builder().value(value).build()
    }

    pub fn builder() -> ConfigTreeBuilder {
        ConfigTreeBuilder::default()
    }

    /// A builder pre-filled with this tree's content.
    pub fn to_builder(&self) -> ConfigTreeBuilder {
        ConfigTreeBuilder {
            value: self.0.value.clone(),
            attributes: self.0.attributes.clone(),
            children: self.0.children.clone(),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.0.value.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.0.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn children(&self) -> impl Iterator<Item = (&ConfigKey, &ConfigTree)> {
        self.0.children.iter().map(|(k, t)| (k, t))
    }

    /// Every child named `key`, in order.
    pub fn children_named<'a, 'k>(&'a self, key: &'k ConfigKey) -> impl Iterator<Item = &'a ConfigTree> + use<'a, 'k> {
        self.0
            .children
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, t)| t)
    }

    pub fn child_count(&self) -> usize {
        self.0.children.len()
    }

    /// The first child named `key`, if any.
    pub fn find_child(&self, key: &ConfigKey) -> Option<&ConfigTree> {
        self.children_named(key).next()
    }

    /// The first child named `key`, or the empty tree.
    pub fn child(&self, key: &ConfigKey) -> ConfigTree {
        self.find_child(key).cloned().unwrap_or_default()
    }

    /// The node at `path`, if present.
    pub fn find_deep_child(&self, path: &ConfigPath) -> Option<&ConfigTree> {
        let mut node = self;
        for key in path.keys() {
            node = node.find_child(key)?;
        }
        Some(node)
    }

    /// The node at `path`, or the empty tree.
    pub fn deep_child(&self, path: &ConfigPath) -> ConfigTree {
        self.find_deep_child(path).cloned().unwrap_or_default()
    }

    /// Whether the node has no value, attributes, or children.
    pub fn is_empty(&self) -> bool {
        self.0.value.is_none() && self.0.attributes.is_empty() && self.0.children.is_empty()
    }

    /// A copy with the first child named `key` replaced.
    ///
    /// `None` removes every child named `key`. A new child is appended
    /// when none exists yet. Later duplicates of `key` are dropped.
    pub fn with_child_replaced(&self, key: &ConfigKey, child: Option<ConfigTree>) -> ConfigTree {
        let mut replacement = child;
        let mut children = Vec::with_capacity(self.0.children.len() + 1);
        let mut seen = false;
        for (k, t) in &self.0.children {
            if k != key {
                children.push((k.clone(), t.clone()));
            } else if !seen {
                seen = true;
                if let Some(new_child) = replacement.take() {
                    children.push((k.clone(), new_child));
                }
            }
        }
        if let Some(new_child) = replacement {
            children.push((key.clone(), new_child));
        }
        ConfigTree(Arc::new(TreeNode {
            value: self.0.value.clone(),
            attributes: self.0.attributes.clone(),
            children,
        }))
    }

    /// A copy with the node at `path` replaced.
    ///
    /// Intermediate nodes are created as needed. Removing a node also
    /// removes ancestors that become empty, but never the root.
    pub fn with_deep_child(&self, path: &ConfigPath, node: Option<ConfigTree>) -> ConfigTree {
        match path.keys() {
            [] => node.unwrap_or_default(),
            [key] => self.with_child_replaced(key, node),
            [key, rest @ ..] => {
                let rest = ConfigPath::new(rest.to_vec());
                let updated = self.child(key).with_deep_child(&rest, node);
                let updated = if updated.is_empty() { None } else { Some(updated) };
                self.with_child_replaced(key, updated)
            }
        }
    }
}

impl fmt::Debug for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ConfigTree");
        if let Some(value) = &self.0.value {
            s.field("value", value);
        }
        if !self.0.attributes.is_empty() {
            s.field("attributes", &self.0.attributes);
        }
        if !self.0.children.is_empty() {
            s.field("children", &self.0.children);
        }
        s.finish()
    }
}

/// Builder for [`ConfigTree`].
#[derive(Debug, Default, Clone)]
pub struct ConfigTreeBuilder {
    value: Option<String>,
    attributes: BTreeMap<String, String>,
    children: Vec<(ConfigKey, ConfigTree)>,
}

impl ConfigTreeBuilder {
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn maybe_value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, key: ConfigKey, child: ConfigTree) -> Self {
        self.children.push((key, child));
        self
    }

    /// Append a child that only holds a text value.
    pub fn leaf(self, name: &str, value: impl Into<String>) -> Self {
        self.child(ConfigKey::new(name), ConfigTree::leaf(value))
    }

    pub fn children(mut self, children: Vec<(ConfigKey, ConfigTree)>) -> Self {
        self.children = children;
        self
    }

    pub fn build(self) -> ConfigTree {
        ConfigTree(Arc::new(TreeNode {
            value: self.value,
            attributes: self.attributes,
            children: self.children,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> ConfigKey {
        ConfigKey::new(name)
    }

    fn sample() -> ConfigTree {
        ConfigTree::builder()
            .leaf("source-level", "17")
            .child(
                key("gradle-daemon"),
                ConfigTree::builder().leaf("timeout", "30").build(),
            )
            .build()
    }

    // ==================== ConfigKey Tests ====================

    #[test]
    fn test_key_display_and_parse() {
        let plain = ConfigKey::new("editor");
        let ns = ConfigKey::with_namespace("editor", "urn:ide");
        assert_eq!(plain.to_string(), "editor");
        assert_eq!(ns.to_string(), "{urn:ide}editor");
        assert_eq!(ConfigKey::parse("{urn:ide}editor"), Some(ns));
        assert_eq!(ConfigKey::parse("editor"), Some(plain));
        assert_eq!(ConfigKey::parse("{urn:ide}"), None);
        assert_eq!(ConfigKey::parse(""), None);
    }

    #[test]
    fn test_key_equality_includes_namespace() {
        assert_ne!(
            ConfigKey::new("a"),
            ConfigKey::with_namespace("a", "urn:x")
        );
    }

    // ==================== ConfigPath Tests ====================

    #[test]
    fn test_path_parse_and_display() {
        let path = ConfigPath::parse("gradle-daemon/timeout");
        assert_eq!(path.keys().len(), 2);
        assert_eq!(path.to_string(), "gradle-daemon/timeout");
        assert!(ConfigPath::parse("").is_empty());
    }

    #[test]
    fn test_path_overlaps() {
        let parent = ConfigPath::parse("gradle-daemon");
        let child = ConfigPath::parse("gradle-daemon/timeout");
        let other = ConfigPath::parse("source-level");
        assert!(parent.overlaps(&child));
        assert!(child.overlaps(&parent));
        assert!(!child.overlaps(&other));
        assert!(ConfigPath::root().overlaps(&other));
    }

    // ==================== Lookup Tests ====================

    #[test]
    fn test_missing_child_is_empty() {
        let tree = sample();
        assert!(tree.child(&key("nope")).is_empty());
        assert!(tree.find_child(&key("nope")).is_none());
        assert!(tree.deep_child(&ConfigPath::parse("a/b/c")).is_empty());
    }

    #[test]
    fn test_deep_child_lookup() {
        let tree = sample();
        let timeout = tree.deep_child(&ConfigPath::parse("gradle-daemon/timeout"));
        assert_eq!(timeout.value(), Some("30"));
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(sample(), sample());
        assert_ne!(sample(), ConfigTree::leaf("17"));
        assert_eq!(ConfigTree::empty(), ConfigTree::builder().build());
    }

    // ==================== Replacement Tests ====================

    #[test]
    fn test_with_child_replaced_keeps_original() {
        let tree = sample();
        let updated = tree.with_child_replaced(&key("source-level"), Some(ConfigTree::leaf("21")));
        assert_eq!(tree.child(&key("source-level")).value(), Some("17"));
        assert_eq!(updated.child(&key("source-level")).value(), Some("21"));
        // Position is preserved.
        assert_eq!(updated.children().next().unwrap().0, &key("source-level"));
    }

    #[test]
    fn test_with_child_replaced_appends_and_removes() {
        let tree = sample();
        let added = tree.with_child_replaced(&key("jvm-args"), Some(ConfigTree::leaf("-Xmx1g")));
        assert_eq!(added.child_count(), 3);
        let removed = added.with_child_replaced(&key("jvm-args"), None);
        assert_eq!(removed, tree);
    }

    #[test]
    fn test_with_deep_child_creates_and_prunes() {
        let path = ConfigPath::parse("gradle-daemon/timeout");
        let tree = ConfigTree::empty().with_deep_child(&path, Some(ConfigTree::leaf("10")));
        assert_eq!(tree.deep_child(&path).value(), Some("10"));

        let cleared = tree.with_deep_child(&path, None);
        assert!(cleared.is_empty());
    }

    #[test]
    fn test_with_deep_child_keeps_siblings() {
        let tree = ConfigTree::builder()
            .child(
                key("gradle-daemon"),
                ConfigTree::builder()
                    .leaf("timeout", "30")
                    .leaf("heap", "512m")
                    .build(),
            )
            .build();
        let cleared = tree.with_deep_child(&ConfigPath::parse("gradle-daemon/timeout"), None);
        let daemon = cleared.child(&key("gradle-daemon"));
        assert_eq!(daemon.child_count(), 1);
        assert_eq!(daemon.child(&key("heap")).value(), Some("512m"));
    }
}
