//! Save-time node policies.
//!
//! A [`ConfigNodeProperty`] tells the writer, for one node of a settings
//! tree, how its children are ordered, whether its own text matters, and
//! how to adjust the node right before it is written. Policies nest: the
//! policy of a node hands out the policy of each child.
//!
//! Sorting is stable and keyed on [`ConfigKey`] only, so siblings sharing a
//! key (list items) keep their relative order. Sorting a sorted tree
//! returns an equal tree.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{ConfigKey, ConfigPath, ConfigTree};

/// Ordering and significance policy for one node of a settings tree.
pub trait ConfigNodeProperty: Send + Sync {
    /// Policy governing the child named `key`.
    fn child_sorter(&self, _key: &ConfigKey) -> &dyn ConfigNodeProperty {
        &DEFAULT_NODE_PROPERTY
    }

    /// Whether this node's own text is insignificant.
    ///
    /// Ignored values are dropped by [`sort_tree`] and therefore do not
    /// take part in [`equivalent`].
    fn ignore_value(&self) -> bool {
        false
    }

    /// Whether children are put in key order.
    fn sorts_children(&self) -> bool {
        true
    }

    /// Last transformation before the node is written.
    fn adjust_nodes(&self, tree: ConfigTree) -> ConfigTree {
        tree
    }
}

/// Sorts children by key, recursively.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNodeProperty;

impl ConfigNodeProperty for DefaultNodeProperty {}

/// The shared default policy.
pub static DEFAULT_NODE_PROPERTY: DefaultNodeProperty = DefaultNodeProperty;

/// Keeps the children of this node in their given order.
///
/// Grandchildren fall back to the default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedNodeProperty;

impl ConfigNodeProperty for OrderedNodeProperty {
    fn sorts_children(&self) -> bool {
        false
    }
}

pub static ORDERED_NODE_PROPERTY: OrderedNodeProperty = OrderedNodeProperty;

/// Leaves the whole subtree exactly as it is.
///
/// Used for fragments nobody knows the schema of.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreservedNodeProperty;

impl ConfigNodeProperty for PreservedNodeProperty {
    fn child_sorter(&self, _key: &ConfigKey) -> &dyn ConfigNodeProperty {
        &PRESERVED_NODE_PROPERTY
    }

    fn sorts_children(&self) -> bool {
        false
    }
}

pub static PRESERVED_NODE_PROPERTY: PreservedNodeProperty = PreservedNodeProperty;

/// A policy with explicit policies for some children.
pub struct KeyedNodeProperty {
    children: BTreeMap<ConfigKey, Arc<dyn ConfigNodeProperty>>,
    unknown: Arc<dyn ConfigNodeProperty>,
    ignore_value: bool,
    sorts_children: bool,
}

impl KeyedNodeProperty {
    pub fn builder() -> KeyedNodePropertyBuilder {
        KeyedNodePropertyBuilder {
            children: BTreeMap::new(),
            unknown: Arc::new(DefaultNodeProperty),
            ignore_value: false,
            sorts_children: true,
        }
    }

    /// Whether `key` has an explicit policy.
    pub fn knows(&self, key: &ConfigKey) -> bool {
        self.children.contains_key(key)
    }

    /// Keys with explicit policies.
    pub fn known_keys(&self) -> impl Iterator<Item = &ConfigKey> {
        self.children.keys()
    }
}

impl ConfigNodeProperty for KeyedNodeProperty {
    fn child_sorter(&self, key: &ConfigKey) -> &dyn ConfigNodeProperty {
        match self.children.get(key) {
            Some(policy) => policy.as_ref(),
            None => self.unknown.as_ref(),
        }
    }

    fn ignore_value(&self) -> bool {
        self.ignore_value
    }

    fn sorts_children(&self) -> bool {
        self.sorts_children
    }
}

impl std::fmt::Debug for KeyedNodeProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedNodeProperty")
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("ignore_value", &self.ignore_value)
            .field("sorts_children", &self.sorts_children)
            .finish()
    }
}

/// Builder for [`KeyedNodeProperty`].
pub struct KeyedNodePropertyBuilder {
    children: BTreeMap<ConfigKey, ChildPolicy>,
    unknown: Arc<dyn ConfigNodeProperty>,
    ignore_value: bool,
    sorts_children: bool,
}

enum ChildPolicy {
    Fixed(Arc<dyn ConfigNodeProperty>),
    Nested(KeyedNodePropertyBuilder),
}

impl KeyedNodePropertyBuilder {
    /// Use `policy` for the child named `key`.
    pub fn child(mut self, key: ConfigKey, policy: Arc<dyn ConfigNodeProperty>) -> Self {
        self.children.insert(key, ChildPolicy::Fixed(policy));
        self
    }

    /// Register the node at `path` with `policy`.
    ///
    /// Intermediate nodes become container nodes whose own text is ignored.
    /// Paths below the same container share it.
    pub fn path(mut self, path: &ConfigPath, policy: Arc<dyn ConfigNodeProperty>) -> Self {
        self.insert_path(path.keys(), policy);
        self
    }

    fn insert_path(&mut self, keys: &[ConfigKey], policy: Arc<dyn ConfigNodeProperty>) {
        match keys {
            [] => {}
            [key] => {
                self.children.insert(key.clone(), ChildPolicy::Fixed(policy));
            }
            [key, rest @ ..] => {
                let entry = self
                    .children
                    .entry(key.clone())
                    .or_insert_with(|| ChildPolicy::Nested(container_builder()));
                if matches!(*entry, ChildPolicy::Fixed(_)) {
                    *entry = ChildPolicy::Nested(container_builder());
                }
                if let ChildPolicy::Nested(nested) = entry {
                    nested.insert_path(rest, policy);
                }
            }
        }
    }

    /// Policy for children without an explicit one.
    pub fn unknown(mut self, policy: Arc<dyn ConfigNodeProperty>) -> Self {
        self.unknown = policy;
        self
    }

    pub fn ignore_value(mut self, ignore: bool) -> Self {
        self.ignore_value = ignore;
        self
    }

    pub fn sorts_children(mut self, sorts: bool) -> Self {
        self.sorts_children = sorts;
        self
    }

    pub fn build(self) -> KeyedNodeProperty {
        let children = self
            .children
            .into_iter()
            .map(|(key, policy)| {
                let policy = match policy {
                    ChildPolicy::Fixed(policy) => policy,
                    ChildPolicy::Nested(builder) => {
                        Arc::new(builder.build()) as Arc<dyn ConfigNodeProperty>
                    }
                };
                (key, policy)
            })
            .collect();
        KeyedNodeProperty {
            children,
            unknown: self.unknown,
            ignore_value: self.ignore_value,
            sorts_children: self.sorts_children,
        }
    }
}

fn container_builder() -> KeyedNodePropertyBuilder {
    KeyedNodeProperty::builder().ignore_value(true)
}

/// The policy for the node at `path` below `root`.
pub fn policy_at<'a>(root: &'a dyn ConfigNodeProperty, path: &ConfigPath) -> &'a dyn ConfigNodeProperty {
    path.keys()
        .iter()
        .fold(root, |policy, key| policy.child_sorter(key))
}

/// Normalize `tree` for writing under `policy`.
///
/// Applies `adjust_nodes`, drops ignored values, and puts children in key
/// order where the policy asks for it, recursively.
pub fn sort_tree(tree: &ConfigTree, policy: &dyn ConfigNodeProperty) -> ConfigTree {
    let tree = policy.adjust_nodes(tree.clone());
    let mut children: Vec<(ConfigKey, ConfigTree)> = tree
        .children()
        .map(|(key, child)| (key.clone(), sort_tree(child, policy.child_sorter(key))))
        .collect();
    if policy.sorts_children() {
        children.sort_by(|(a, _), (b, _)| a.cmp(b));
    }

    let mut builder = ConfigTree::builder().children(children);
    if !policy.ignore_value() {
        builder = builder.maybe_value(tree.value().map(str::to_string));
    }
    for (name, value) in tree.attributes() {
        builder = builder.attribute(name, value);
    }
    builder.build()
}

/// Whether `a` and `b` are the same once normalized under `policy`.
pub fn equivalent(a: &ConfigTree, b: &ConfigTree, policy: &dyn ConfigNodeProperty) -> bool {
    a == b || sort_tree(a, policy) == sort_tree(b, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> ConfigKey {
        ConfigKey::new(name)
    }

    fn unsorted() -> ConfigTree {
        ConfigTree::builder()
            .leaf("zeta", "1")
            .child(
                key("alpha"),
                ConfigTree::builder().leaf("y", "2").leaf("x", "3").build(),
            )
            .leaf("Beta", "4")
            .build()
    }

    fn names(tree: &ConfigTree) -> Vec<String> {
        tree.children().map(|(k, _)| k.to_string()).collect()
    }

    // ==================== Default Policy Tests ====================

    #[test]
    fn test_default_sorts_recursively() {
        let sorted = sort_tree(&unsorted(), &DEFAULT_NODE_PROPERTY);
        // Case-sensitive: uppercase sorts first.
        assert_eq!(names(&sorted), vec!["Beta", "alpha", "zeta"]);
        assert_eq!(names(&sorted.child(&key("alpha"))), vec!["x", "y"]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let once = sort_tree(&unsorted(), &DEFAULT_NODE_PROPERTY);
        let twice = sort_tree(&once, &DEFAULT_NODE_PROPERTY);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_is_stable_for_duplicate_keys() {
        let tree = ConfigTree::builder()
            .leaf("arg", "-Xmx1g")
            .leaf("arg", "-Dfoo=bar")
            .leaf("arg", "-ea")
            .build();
        let sorted = sort_tree(&tree, &DEFAULT_NODE_PROPERTY);
        let values: Vec<_> = sorted.children().map(|(_, t)| t.value().unwrap()).collect();
        assert_eq!(values, vec!["-Xmx1g", "-Dfoo=bar", "-ea"]);
    }

    #[test]
    fn test_namespaced_keys_sort_after_plain() {
        let tree = ConfigTree::builder()
            .child(ConfigKey::with_namespace("a", "urn:x"), ConfigTree::leaf("1"))
            .leaf("a", "2")
            .build();
        let sorted = sort_tree(&tree, &DEFAULT_NODE_PROPERTY);
        assert_eq!(names(&sorted), vec!["a", "{urn:x}a"]);
    }

    // ==================== Other Policy Tests ====================

    #[test]
    fn test_ordered_keeps_children() {
        let sorted = sort_tree(&unsorted(), &ORDERED_NODE_PROPERTY);
        assert_eq!(names(&sorted), vec!["zeta", "alpha", "Beta"]);
        // Grandchildren still sorted.
        assert_eq!(names(&sorted.child(&key("alpha"))), vec!["x", "y"]);
    }

    #[test]
    fn test_preserved_keeps_everything() {
        let tree = unsorted();
        assert_eq!(sort_tree(&tree, &PRESERVED_NODE_PROPERTY), tree);
    }

    #[test]
    fn test_keyed_policy_per_child() {
        let policy = KeyedNodeProperty::builder()
            .child(key("alpha"), Arc::new(OrderedNodeProperty))
            .build();
        let sorted = sort_tree(&unsorted(), &policy);
        assert_eq!(names(&sorted), vec!["Beta", "alpha", "zeta"]);
        assert_eq!(names(&sorted.child(&key("alpha"))), vec!["y", "x"]);
        assert!(policy.knows(&key("alpha")));
        assert!(!policy.knows(&key("zeta")));
    }

    #[test]
    fn test_path_registration_creates_containers() {
        let policy = KeyedNodeProperty::builder()
            .path(&ConfigPath::parse("daemon/jvm"), Arc::new(OrderedNodeProperty))
            .path(&ConfigPath::parse("daemon/timeout"), Arc::new(DefaultNodeProperty))
            .build();
        let daemon = policy.child_sorter(&key("daemon"));
        assert!(daemon.ignore_value());
        assert!(!daemon.child_sorter(&key("jvm")).sorts_children());
        assert!(!policy_at(&policy, &ConfigPath::parse("daemon/jvm")).sorts_children());
    }

    // ==================== Equivalence Tests ====================

    #[test]
    fn test_equivalent_ignores_order() {
        let a = unsorted();
        let b = sort_tree(&a, &DEFAULT_NODE_PROPERTY);
        assert_ne!(a, b);
        assert!(equivalent(&a, &b, &DEFAULT_NODE_PROPERTY));
        assert!(!equivalent(&a, &b, &PRESERVED_NODE_PROPERTY));
    }

    #[test]
    fn test_equivalent_ignores_insignificant_value() {
        let policy = KeyedNodeProperty::builder().ignore_value(true).build();
        let a = ConfigTree::builder().value("\n  ").leaf("x", "1").build();
        let b = ConfigTree::builder().leaf("x", "1").build();
        assert!(equivalent(&a, &b, &policy));
        assert!(!equivalent(&a, &b, &DEFAULT_NODE_PROPERTY));
    }

    #[test]
    fn test_adjust_nodes_runs_before_write() {
        struct DropEmpty;
        impl ConfigNodeProperty for DropEmpty {
            fn adjust_nodes(&self, tree: ConfigTree) -> ConfigTree {
                let children = tree
                    .children()
                    .filter(|(_, c)| !c.is_empty())
                    .map(|(k, c)| (k.clone(), c.clone()))
                    .collect();
                tree.to_builder().children(children).build()
            }
        }
        let tree = ConfigTree::builder()
            .child(key("empty"), ConfigTree::empty())
            .leaf("kept", "1")
            .build();
        let sorted = sort_tree(&tree, &DropEmpty);
        assert_eq!(names(&sorted), vec!["kept"]);
    }
}
