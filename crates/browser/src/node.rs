use crate::compute::ChildrenComputer;
use crate::{BrowserConfig, Result};
use heapscope_snapshot::InstanceId;
use log::debug;
use std::fmt;
use std::ops::Range;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

/// Notification hook invoked on the tree root after children are swapped,
/// so the view can repaint.
pub type RefreshCallback = Arc<dyn Fn() + Send + Sync>;

/// Children of one node.
///
/// The three states are observably distinct: never asked, placeholder
/// published while a computation is in flight, and complete (possibly
/// empty) list. Replacement is atomic — readers either see the previous
/// complete list or the next one, never a partial sequence.
#[derive(Clone)]
pub enum ChildrenState {
    Unmaterialized,
    Pending(Arc<[Node]>),
    Materialized(Arc<[Node]>),
}

enum NodeKind {
    /// Synthetic root of one snapshot view.
    Root { refresh: Option<RefreshCallback> },
    /// Wraps one heap instance.
    Instance { instance: InstanceId },
    /// Owns a contiguous sub-range of a larger instance collection,
    /// produced by the grouping policy.
    Container {
        collection: Arc<[InstanceId]>,
        range: Range<usize>,
    },
    /// Transient placeholder while children are being computed.
    Progress,
    /// Sentinel left behind when children computation ran out of memory.
    OutOfMemory,
}

struct NodeInner {
    name: String,
    parent: Weak<NodeInner>,
    kind: NodeKind,
    computer: Option<Arc<dyn ChildrenComputer>>,
    children: RwLock<ChildrenState>,
}

/// Cloneable handle to one position in the navigation tree.
///
/// Nodes are created on demand when a parent's children are requested and
/// dropped when an ancestor's children are replaced or the view closes;
/// there is no node cache.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl Node {
    fn new(
        name: String,
        parent: Option<&Node>,
        kind: NodeKind,
        computer: Option<Arc<dyn ChildrenComputer>>,
    ) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                name,
                parent: parent.map_or_else(Weak::new, |p| Arc::downgrade(&p.inner)),
                kind,
                computer,
                children: RwLock::new(ChildrenState::Unmaterialized),
            }),
        }
    }

    /// Synthetic root of a snapshot view. At most one per tree.
    pub fn root(
        name: impl Into<String>,
        refresh: Option<RefreshCallback>,
        computer: Option<Arc<dyn ChildrenComputer>>,
    ) -> Self {
        Self::new(name.into(), None, NodeKind::Root { refresh }, computer)
    }

    pub fn new_instance(
        parent: &Node,
        name: impl Into<String>,
        instance: InstanceId,
        computer: Arc<dyn ChildrenComputer>,
    ) -> Self {
        Self::new(
            name.into(),
            Some(parent),
            NodeKind::Instance { instance },
            Some(computer),
        )
    }

    pub fn container(
        parent: &Node,
        name: impl Into<String>,
        collection: Arc<[InstanceId]>,
        range: Range<usize>,
        computer: Arc<dyn ChildrenComputer>,
    ) -> Self {
        Self::new(
            name.into(),
            Some(parent),
            NodeKind::Container { collection, range },
            Some(computer),
        )
    }

    pub fn progress(parent: &Node) -> Self {
        Self::new(
            "computing...".to_string(),
            Some(parent),
            NodeKind::Progress,
            None,
        )
    }

    pub fn out_of_memory(parent: &Node) -> Self {
        Self::new(
            "<out of memory>".to_string(),
            Some(parent),
            NodeKind::OutOfMemory,
            None,
        )
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<Node> {
        self.inner.parent.upgrade().map(|inner| Node { inner })
    }

    pub fn is_root(&self) -> bool {
        matches!(self.inner.kind, NodeKind::Root { .. })
    }

    pub fn is_progress(&self) -> bool {
        matches!(self.inner.kind, NodeKind::Progress)
    }

    pub fn is_out_of_memory(&self) -> bool {
        matches!(self.inner.kind, NodeKind::OutOfMemory)
    }

    pub fn is_container(&self) -> bool {
        matches!(self.inner.kind, NodeKind::Container { .. })
    }

    /// The wrapped heap instance, for instance nodes.
    pub fn instance(&self) -> Option<InstanceId> {
        match &self.inner.kind {
            NodeKind::Instance { instance } => Some(*instance),
            _ => None,
        }
    }

    /// The owned sub-range of the underlying collection, for containers.
    pub fn container_slice(&self) -> Option<&[InstanceId]> {
        match &self.inner.kind {
            NodeKind::Container { collection, range } => collection.get(range.clone()),
            _ => None,
        }
    }

    /// Per-variant membership test used by the GC-root path resolver:
    /// an instance node contains exactly its own instance, a container
    /// contains every instance of its owned sub-range.
    pub fn contains_instance(&self, id: InstanceId) -> bool {
        match &self.inner.kind {
            NodeKind::Instance { instance } => *instance == id,
            NodeKind::Container { .. } => self
                .container_slice()
                .is_some_and(|slice| slice.contains(&id)),
            _ => false,
        }
    }

    /// Walk parent links up to the tree root. Returns the topmost
    /// reachable node if the root was already dropped.
    pub fn tree_root(&self) -> Node {
        let mut node = self.clone();
        while !node.is_root() {
            match node.parent() {
                Some(parent) => node = parent,
                None => break,
            }
        }
        node
    }

    pub(crate) fn computer(&self) -> Option<Arc<dyn ChildrenComputer>> {
        self.inner.computer.clone()
    }

    /// Invoke the view-refresh hook, if this is a root that carries one.
    pub fn refresh_view(&self) {
        if let NodeKind::Root { refresh: Some(refresh) } = &self.inner.kind {
            refresh();
        }
    }

    fn read_children(&self) -> RwLockReadGuard<'_, ChildrenState> {
        self.inner.children.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_children(&self) -> RwLockWriteGuard<'_, ChildrenState> {
        self.inner.children.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn children(&self) -> ChildrenState {
        self.read_children().clone()
    }

    /// Complete child list, if materialized. A pending placeholder is not
    /// a materialized list.
    pub fn materialized_children(&self) -> Option<Arc<[Node]>> {
        match &*self.read_children() {
            ChildrenState::Materialized(children) => Some(Arc::clone(children)),
            _ => None,
        }
    }

    /// Whether a complete child list is present — distinguishes "not yet
    /// asked" from "materialized and empty".
    pub fn currently_has_children(&self) -> bool {
        matches!(&*self.read_children(), ChildrenState::Materialized(_))
    }

    /// Atomically replace the full children sequence.
    pub fn set_children(&self, children: Vec<Node>) {
        *self.write_children() = ChildrenState::Materialized(children.into());
    }

    /// Publish a transient placeholder while a computation is in flight.
    pub(crate) fn set_pending(&self, placeholder: Arc<[Node]>) {
        *self.write_children() = ChildrenState::Pending(placeholder);
    }

    /// Replace children and notify the tree root so the view refreshes.
    /// Only call from the interactive thread.
    pub fn change_children(&self, children: Vec<Node>) {
        self.set_children(children);
        self.tree_root().refresh_view();
    }

    /// Materialize children synchronously through the node's computer,
    /// bypassing the asynchronous protocol. Used on the GC-root resolution
    /// path, which runs off the interactive thread and must not observe a
    /// placeholder.
    pub fn ensure_children_sync(&self) -> Result<Arc<[Node]>> {
        if let Some(children) = self.materialized_children() {
            return Ok(children);
        }
        let children: Arc<[Node]> = match &self.inner.computer {
            Some(computer) => computer.compute_children(self)?.into(),
            None => Arc::from(Vec::new()),
        };
        debug!(
            "synchronously materialized {} children of '{}'",
            children.len(),
            self.name()
        );
        *self.write_children() = ChildrenState::Materialized(Arc::clone(&children));
        Ok(children)
    }

    /// Display label for the whole path from the root to this node.
    ///
    /// Each segment is the node's simplified name (trailing parenthesized
    /// annotation stripped), joined by the configured separator. Once the
    /// accumulated length reaches the configured bound (counted in
    /// characters, labels are not ASCII-only), the truncation marker is
    /// inserted once at the front and accumulation stops.
    pub fn full_path_name(&self, config: &BrowserConfig) -> String {
        let mut out = String::new();
        let mut node = self.clone();
        while !node.is_root() {
            if out.chars().count() >= config.max_full_name_len {
                out.insert_str(0, &config.truncation_marker);
                return out;
            }
            let segment = format!("{}{}", config.path_separator, simplified_name(node.name()));
            out.insert_str(0, &segment);
            match node.parent() {
                Some(parent) => node = parent,
                None => return out,
            }
        }
        out.insert_str(0, simplified_name(node.name()));
        out
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.inner.kind {
            NodeKind::Root { .. } => "Root",
            NodeKind::Instance { .. } => "Instance",
            NodeKind::Container { .. } => "Container",
            NodeKind::Progress => "Progress",
            NodeKind::OutOfMemory => "OutOfMemory",
        };
        f.debug_struct("Node")
            .field("kind", &kind)
            .field("name", &self.inner.name)
            .finish()
    }
}

/// Strip the trailing parenthesized annotation (e.g. a GC-root-type
/// suffix) by locating the open-parenthesis matching the final close.
fn simplified_name(name: &str) -> &str {
    let trimmed = name.trim_end();
    if !trimmed.ends_with(')') {
        return trimmed;
    }
    let mut depth = 0usize;
    for (idx, ch) in trimmed.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    return trimmed[..idx].trim_end();
                }
            }
            _ => {}
        }
    }
    // Unbalanced parentheses: leave the name untouched.
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::ChildrenComputer;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedChildren {
        labels: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl FixedChildren {
        fn new(labels: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                labels,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl ChildrenComputer for FixedChildren {
        fn compute_children(&self, parent: &Node) -> Result<Vec<Node>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .labels
                .iter()
                .enumerate()
                .map(|(i, label)| {
                    Node::new_instance(
                        parent,
                        *label,
                        InstanceId(i as u64),
                        FixedChildren::new(Vec::new()) as Arc<dyn ChildrenComputer>,
                    )
                })
                .collect())
        }
    }

    fn leaf_chain(names: &[&str]) -> Node {
        let root = Node::root(names[0], None, None);
        // Parent links are weak; keep the root (and through its children,
        // the whole chain) alive for the duration of the test.
        std::mem::forget(root.clone());
        let mut node = root;
        for (i, name) in names[1..].iter().enumerate() {
            let child = Node::new_instance(
                &node,
                *name,
                InstanceId(i as u64),
                FixedChildren::new(Vec::new()) as Arc<dyn ChildrenComputer>,
            );
            node.set_children(vec![child.clone()]);
            node = child;
        }
        node
    }

    #[test]
    fn children_states_are_distinguishable() {
        let root = Node::root("heap", None, None);
        assert!(matches!(root.children(), ChildrenState::Unmaterialized));
        assert!(!root.currently_has_children());

        let placeholder: Arc<[Node]> = Arc::from(vec![Node::progress(&root)]);
        root.set_pending(placeholder);
        assert!(matches!(root.children(), ChildrenState::Pending(_)));
        assert!(!root.currently_has_children());
        assert!(root.materialized_children().is_none());

        root.set_children(Vec::new());
        assert!(root.currently_has_children());
        assert_eq!(root.materialized_children().map(|c| c.len()), Some(0));
    }

    #[test]
    fn parent_links_walk_to_the_root() {
        let leaf = leaf_chain(&["heap", "a", "b", "c"]);
        assert_eq!(leaf.name(), "c");
        assert!(!leaf.is_root());
        let root = leaf.tree_root();
        assert!(root.is_root());
        assert_eq!(root.name(), "heap");
    }

    #[test]
    fn contains_instance_dispatches_per_variant() {
        let root = Node::root("heap", None, None);
        let computer = FixedChildren::new(Vec::new());
        let inst = Node::new_instance(&root, "a", InstanceId(7), computer.clone());
        assert!(inst.contains_instance(InstanceId(7)));
        assert!(!inst.contains_instance(InstanceId(8)));

        let collection: Arc<[InstanceId]> =
            Arc::from((0..10u64).map(InstanceId).collect::<Vec<_>>());
        let container = Node::container(&root, "items 4..8", collection, 3..7, computer);
        assert!(container.contains_instance(InstanceId(3)));
        assert!(container.contains_instance(InstanceId(6)));
        assert!(!container.contains_instance(InstanceId(7)));

        assert!(!Node::progress(&root).contains_instance(InstanceId(3)));
        assert!(!root.contains_instance(InstanceId(3)));
    }

    #[test]
    fn ensure_children_sync_computes_once() {
        let root = Node::root("heap", None, None);
        let computer = FixedChildren::new(vec!["a", "b"]);
        let inst = Node::new_instance(&root, "x", InstanceId(0), computer.clone());
        let children = inst.ensure_children_sync().expect("children");
        assert_eq!(children.len(), 2);
        let again = inst.ensure_children_sync().expect("children");
        assert_eq!(again.len(), 2);
        assert_eq!(computer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn refresh_view_fires_only_on_roots_with_a_callback() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = Arc::clone(&fired);
        let root = Node::root(
            "heap",
            Some(Arc::new(move || {
                fired2.fetch_add(1, Ordering::SeqCst);
            })),
            None,
        );
        let child = Node::new_instance(
            &root,
            "a",
            InstanceId(0),
            FixedChildren::new(Vec::new()) as Arc<dyn ChildrenComputer>,
        );
        root.set_children(vec![child.clone()]);

        child.change_children(Vec::new());
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // set_children alone does not notify.
        child.set_children(Vec::new());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn simplified_name_strips_trailing_annotation() {
        assert_eq!(simplified_name("Thread#3 (thread stack)"), "Thread#3");
        assert_eq!(simplified_name("plain"), "plain");
        assert_eq!(simplified_name("call(x) (static field)"), "call(x)");
        assert_eq!(simplified_name("oops)"), "oops)");
    }

    #[test]
    fn full_path_name_joins_simplified_segments() {
        let leaf = leaf_chain(&["heap", "cache (static field)", "entries"]);
        assert_eq!(
            leaf.full_path_name(&BrowserConfig::default()),
            "heap.cache.entries"
        );
    }

    #[test]
    fn full_path_name_truncates_deep_chains_deterministically() {
        let names: Vec<String> = (0..40).map(|i| format!("node{i:02}")).collect();
        let mut all: Vec<&str> = vec!["heap"];
        all.extend(names.iter().map(String::as_str));
        let leaf = leaf_chain(&all);

        let config = BrowserConfig::default();
        let first = leaf.full_path_name(&config);
        let second = leaf.full_path_name(&config);
        assert_eq!(first, second);
        assert!(first.starts_with("[...]"));
        assert!(first.ends_with(".node39"));
        // Bounded: marker plus at most one segment beyond the limit.
        assert!(first.len() <= config.max_full_name_len + "[...]".len() + ".node00".len());
    }

    #[test]
    fn full_path_name_bound_counts_characters_not_bytes() {
        // Twelve Greek segments: 76 characters but well over 100 bytes.
        // The bound is a display-width cap, so no truncation happens.
        let segment = "αβγδε";
        let mut all = vec!["heap"];
        all.extend(std::iter::repeat(segment).take(12));
        let leaf = leaf_chain(&all);

        let path = leaf.full_path_name(&BrowserConfig::default());
        assert!(path.len() > 100);
        assert!(!path.contains("[...]"));
        assert_eq!(path.chars().filter(|c| *c == '.').count(), 12);
    }
}
