use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;

/// Owned key/value view handed out by the store. Never aliases a node's storage.
pub type AttributeMap = HashMap<String, String>;

/// Handle to one node of the scope tree.
///
/// Cloning the handle is cheap and yields another handle to the *same* node; use
/// [`AttributeScope::create_child`] to open a nested scope. A child keeps its parent alive
/// through a shared handle but never mutates it.
///
/// Equality is identity: two handles are equal when they point to the same node.
#[derive(Clone)]
pub struct AttributeScope {
    inner: Arc<ScopeNode>,
}

struct ScopeNode {
    name: String,
    data: RwLock<AttributeMap>,
    parent: Option<AttributeScope>,
}

impl AttributeScope {
    pub fn new_root(name: impl Into<String>) -> Self {
        Self::with_parent(name.into(), None)
    }

    pub fn create_child(&self, name: impl Into<String>) -> Self {
        Self::with_parent(name.into(), Some(self.clone()))
    }

    fn with_parent(name: String, parent: Option<AttributeScope>) -> Self {
        Self {
            inner: Arc::new(ScopeNode {
                name,
                data: RwLock::new(AttributeMap::new()),
                parent,
            }),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Writes `key` into this node only, replacing any previous value.
    ///
    /// The value is rendered through [`fmt::Display`] right away and only the string is kept.
    /// Consumers (log lines, span attributes) are string based, so the original type is
    /// deliberately dropped.
    pub fn set(&self, key: impl Into<String>, value: impl fmt::Display) {
        self.inner.data.write().insert(key.into(), value.to_string());
    }

    /// [`AttributeScope::set`] for every pair, under a single write lock.
    pub fn extend<I, K, V>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: fmt::Display,
    {
        let mut data = self.inner.data.write();
        for (key, value) in pairs {
            data.insert(key.into(), value.to_string());
        }
    }

    /// Removes `key` from this node only. An ancestor defining the same key becomes visible
    /// again in [`AttributeScope::get_all`].
    pub fn delete(&self, key: &str) {
        self.inner.data.write().remove(key);
    }

    /// Value set on this node. Ancestors are not consulted.
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.data.read().get(key).cloned()
    }

    /// Snapshot of this node's own attributes, without ancestors.
    pub fn own_attributes(&self) -> AttributeMap {
        self.inner.data.read().clone()
    }

    /// Flattened view of the whole chain: root first, this node last, so the deepest
    /// definition of a key wins.
    ///
    /// Nodes are locked one at a time; the result is consistent per node but is not an
    /// atomic snapshot of the chain.
    pub fn get_all(&self) -> AttributeMap {
        let chain = self.lineage().collect::<Vec<_>>();
        let mut merged = AttributeMap::new();

        for scope in chain.into_iter().rev() {
            let data = scope.inner.data.read();
            merged.extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        merged
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    #[inline]
    pub fn parent(&self) -> Option<&AttributeScope> {
        self.inner.parent.as_ref()
    }

    pub fn root(&self) -> &AttributeScope {
        self.lineage().last().unwrap_or(self)
    }

    /// Number of ancestors, `0` for a root.
    pub fn depth(&self) -> usize {
        self.lineage().count() - 1
    }

    /// Dot-joined names from the root down to this node, e.g. `request.handler`.
    pub fn path(&self) -> String {
        let mut names = self.lineage().map(|scope| scope.name()).collect::<Vec<_>>();
        names.reverse();
        names.join(".")
    }

    /// This node followed by each of its ancestors, up to the root.
    pub fn lineage(&self) -> impl Iterator<Item = &AttributeScope> {
        std::iter::successors(Some(self), |scope| scope.parent())
    }
}

impl PartialEq for AttributeScope {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for AttributeScope {}

impl fmt::Debug for AttributeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeScope")
            .field("path", &self.path())
            .field("attributes", &*self.inner.data.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn last_write_wins_within_a_node() {
        let root = AttributeScope::new_root("req");
        root.set("a", "1");
        root.set("b", "x");
        root.set("a", "2");
        root.set("a", "3");

        assert_eq!(root.get("a").as_deref(), Some("3"));
        assert_eq!(root.get("b").as_deref(), Some("x"));
        assert_eq!(root.get("missing"), None);
        assert_eq!(root.get_all(), root.own_attributes());
        assert_eq!(root.get_all(), map(&[("a", "3"), ("b", "x")]));
    }

    #[test]
    fn child_sees_parent_but_parent_never_sees_child() {
        let root = AttributeScope::new_root("req");
        root.set("a", "1");
        let child = root.create_child("x");
        child.set("b", "2");

        assert_eq!(child.get_all(), map(&[("a", "1"), ("b", "2")]));
        assert_eq!(root.get_all(), map(&[("a", "1")]));
    }

    #[test]
    fn deepest_definition_overrides() {
        let root = AttributeScope::new_root("req");
        root.set("a", "1");
        let child = root.create_child("x");
        child.set("a", "2");

        assert_eq!(child.get_all()["a"], "2");
        assert_eq!(root.get_all()["a"], "1");
    }

    #[test]
    fn delete_falls_back_to_ancestor_value() {
        let root = AttributeScope::new_root("req");
        root.set("a", "1");
        let child = root.create_child("x");
        child.set("a", "2");

        child.delete("a");

        assert_eq!(child.get("a"), None);
        assert_eq!(child.get_all()["a"], "1");
        assert_eq!(root.get_all()["a"], "1");

        // deleting something that is not there is a no-op
        child.delete("a");
        child.delete("never-set");
        assert_eq!(child.get_all(), map(&[("a", "1")]));
    }

    #[test]
    fn get_does_not_consult_ancestors() {
        let root = AttributeScope::new_root("req");
        root.set("a", "1");
        let child = root.create_child("x");

        assert_eq!(child.get("a"), None);
        assert_eq!(child.get_all()["a"], "1");
    }

    #[test]
    fn paths_and_roots() {
        let root = AttributeScope::new_root("req");
        let child = root.create_child("handler");
        let grandchild = child.create_child("db");

        assert_eq!(root.path(), "req");
        assert_eq!(child.path(), "req.handler");
        assert_eq!(grandchild.path(), "req.handler.db");

        assert!(root.is_root());
        assert!(!child.is_root());
        assert_eq!(child.root(), &root);
        assert_eq!(grandchild.root(), &root);
        assert_eq!(root.root(), &root);

        assert_eq!(root.parent(), None);
        assert_eq!(child.parent(), Some(&root));
        assert_eq!(grandchild.parent(), Some(&child));

        assert_eq!(root.depth(), 0);
        assert_eq!(grandchild.depth(), 2);
    }

    #[test]
    fn siblings_are_isolated() {
        let root = AttributeScope::new_root("req");
        root.set("shared", "root");
        let left = root.create_child("left");
        let right = root.create_child("right");
        left.set("side", "left");
        right.set("side", "right");
        let cousin = right.create_child("nested");

        assert_eq!(left.get_all(), map(&[("shared", "root"), ("side", "left")]));
        assert_eq!(cousin.get_all(), map(&[("shared", "root"), ("side", "right")]));
        assert_ne!(left, right);
    }

    #[test]
    fn get_all_returns_independent_copies() {
        let root = AttributeScope::new_root("req");
        root.set("a", "1");
        let child = root.create_child("x");
        child.set("b", "2");

        let mut first = child.get_all();
        let second = child.get_all();
        assert_eq!(first, second);

        first.insert("a".to_string(), "changed".to_string());
        first.remove("b");

        assert_eq!(child.get_all(), second);
        assert_eq!(root.get("a").as_deref(), Some("1"));
    }

    #[test]
    fn create_child_leaves_parent_untouched() {
        let root = AttributeScope::new_root("req");
        root.set("a", "1");
        let before = root.own_attributes();

        let child = root.create_child("x");
        child.set("a", "2");

        assert_eq!(root.own_attributes(), before);
        assert_eq!(child.name(), "x");
        assert!(child.own_attributes().contains_key("a"));
    }

    #[test]
    fn values_are_stringified_on_write() {
        let root = AttributeScope::new_root("req");
        root.set("status_code", 200);
        root.set("ratio", 0.5);
        root.set("ok", true);
        root.extend([("x", 1), ("y", 2)]);

        assert_eq!(
            root.get_all(),
            map(&[
                ("status_code", "200"),
                ("ratio", "0.5"),
                ("ok", "true"),
                ("x", "1"),
                ("y", "2"),
            ])
        );
    }

    #[test]
    fn clones_point_to_the_same_node() {
        let root = AttributeScope::new_root("req");
        let alias = root.clone();
        alias.set("a", "1");

        assert_eq!(root, alias);
        assert_eq!(root.get("a").as_deref(), Some("1"));
    }

    #[test]
    fn concurrent_reader_and_writer() {
        let root = AttributeScope::new_root("req");
        let child = root.create_child("handler");

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..1000 {
                    child.set("counter", i);
                }
            });
            s.spawn(|| {
                for _ in 0..1000 {
                    let view = root.create_child("reader").get_all();
                    assert!(!view.contains_key("counter"));
                    let _ = child.get_all();
                }
            });
        });

        assert_eq!(child.get("counter").as_deref(), Some("999"));
    }

    #[test]
    fn debug_output_names_the_path() {
        let root = AttributeScope::new_root("req");
        let child = root.create_child("handler");
        child.set("k", "v");

        let rendered = format!("{:?}", child);
        assert!(rendered.contains("req.handler"));
        assert!(rendered.contains("\"k\""));
    }
}
