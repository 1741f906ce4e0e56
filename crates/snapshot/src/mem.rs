use crate::{GcRootKind, InstanceId, Snapshot};
use log::debug;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory [`Snapshot`] for tests and headless hosts.
///
/// Mimics the laziness of a real heap-dump reader: the first call to
/// [`references`](Snapshot::references) or
/// [`nearest_gc_root_pointer`](Snapshot::nearest_gc_root_pointer) performs a
/// simulated heap-wide index pass (optionally slow, optionally failing).
/// Pass counters and the forcing order are recorded so single-flight and
/// ordering guarantees can be asserted from the outside.
pub struct MemSnapshot {
    instances: Vec<InstanceId>,
    labels: HashMap<InstanceId, String>,
    references: HashMap<InstanceId, Vec<InstanceId>>,
    root_pointers: HashMap<InstanceId, InstanceId>,
    gc_root_kinds: HashMap<InstanceId, GcRootKind>,

    build_delay: Duration,
    references_forced: AtomicBool,
    gc_roots_forced: AtomicBool,
    reference_passes: AtomicUsize,
    gc_root_passes: AtomicUsize,
    fail_next_reference_pass: AtomicBool,
    forced_order: Mutex<Vec<&'static str>>,
}

impl MemSnapshot {
    pub fn builder() -> MemSnapshotBuilder {
        MemSnapshotBuilder::default()
    }

    /// Number of heap-wide reference index passes performed so far.
    pub fn reference_index_passes(&self) -> usize {
        self.reference_passes.load(Ordering::SeqCst)
    }

    /// Number of heap-wide GC-root index passes performed so far.
    pub fn gc_root_index_passes(&self) -> usize {
        self.gc_root_passes.load(Ordering::SeqCst)
    }

    /// Order in which the two indices were forced (`"references"`,
    /// `"gc_roots"`).
    pub fn forced_order(&self) -> Vec<&'static str> {
        self.forced_order.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make the next reference index pass panic, simulating a reader
    /// failure. The flag is consumed by that pass, so a retry succeeds.
    pub fn fail_next_reference_pass(&self) {
        self.fail_next_reference_pass.store(true, Ordering::SeqCst);
    }

    fn force_reference_index(&self) {
        if self.references_forced.load(Ordering::Acquire) {
            return;
        }
        self.reference_passes.fetch_add(1, Ordering::SeqCst);
        if !self.build_delay.is_zero() {
            std::thread::sleep(self.build_delay);
        }
        if self.fail_next_reference_pass.swap(false, Ordering::SeqCst) {
            panic!("simulated reference index failure");
        }
        self.forced_order
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push("references");
        debug!("reference index pass complete ({} instances)", self.instances.len());
        self.references_forced.store(true, Ordering::Release);
    }

    fn force_gc_root_index(&self) {
        if self.gc_roots_forced.load(Ordering::Acquire) {
            return;
        }
        self.gc_root_passes.fetch_add(1, Ordering::SeqCst);
        if !self.build_delay.is_zero() {
            std::thread::sleep(self.build_delay);
        }
        self.forced_order
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push("gc_roots");
        debug!("GC root index pass complete ({} instances)", self.instances.len());
        self.gc_roots_forced.store(true, Ordering::Release);
    }
}

impl Snapshot for MemSnapshot {
    fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn all_instances(&self) -> Box<dyn Iterator<Item = InstanceId> + '_> {
        Box::new(self.instances.iter().copied())
    }

    fn references(&self, id: InstanceId) -> Vec<InstanceId> {
        self.force_reference_index();
        self.references.get(&id).cloned().unwrap_or_default()
    }

    fn nearest_gc_root_pointer(&self, id: InstanceId) -> Option<InstanceId> {
        self.force_gc_root_index();
        self.root_pointers.get(&id).copied()
    }

    fn gc_root_kind(&self, id: InstanceId) -> Option<GcRootKind> {
        self.gc_root_kinds.get(&id).copied()
    }

    fn instance_label(&self, id: InstanceId) -> String {
        self.labels
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

/// Builder for [`MemSnapshot`]. Ids are assigned sequentially by
/// [`add_instance`](MemSnapshotBuilder::add_instance).
#[derive(Default)]
pub struct MemSnapshotBuilder {
    instances: Vec<InstanceId>,
    labels: HashMap<InstanceId, String>,
    references: HashMap<InstanceId, Vec<InstanceId>>,
    root_pointers: HashMap<InstanceId, InstanceId>,
    gc_root_kinds: HashMap<InstanceId, GcRootKind>,
    build_delay: Duration,
}

impl MemSnapshotBuilder {
    pub fn add_instance(&mut self, label: impl Into<String>) -> InstanceId {
        let id = InstanceId(self.instances.len() as u64);
        self.instances.push(id);
        self.labels.insert(id, label.into());
        id
    }

    pub fn add_reference(&mut self, from: InstanceId, to: InstanceId) -> &mut Self {
        self.references.entry(from).or_default().push(to);
        self
    }

    /// Mark `id` as a GC root of the given kind. Its nearest-root pointer
    /// becomes the self-loop sentinel.
    pub fn set_gc_root(&mut self, id: InstanceId, kind: GcRootKind) -> &mut Self {
        self.gc_root_kinds.insert(id, kind);
        self.root_pointers.insert(id, id);
        self
    }

    /// Set the precomputed next hop from `id` toward its nearest GC root.
    pub fn set_root_pointer(&mut self, id: InstanceId, toward: InstanceId) -> &mut Self {
        self.root_pointers.insert(id, toward);
        self
    }

    /// Simulated duration of each heap-wide index pass.
    pub fn build_delay(&mut self, delay: Duration) -> &mut Self {
        self.build_delay = delay;
        self
    }

    pub fn build(&mut self) -> MemSnapshot {
        MemSnapshot {
            instances: std::mem::take(&mut self.instances),
            labels: std::mem::take(&mut self.labels),
            references: std::mem::take(&mut self.references),
            root_pointers: std::mem::take(&mut self.root_pointers),
            gc_root_kinds: std::mem::take(&mut self.gc_root_kinds),
            build_delay: self.build_delay,
            references_forced: AtomicBool::new(false),
            gc_roots_forced: AtomicBool::new(false),
            reference_passes: AtomicUsize::new(0),
            gc_root_passes: AtomicUsize::new(0),
            fail_next_reference_pass: AtomicBool::new(false),
            forced_order: Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn linked_pair() -> (MemSnapshot, InstanceId, InstanceId) {
        let mut b = MemSnapshot::builder();
        let root = b.add_instance("Root");
        let leaf = b.add_instance("Leaf");
        b.add_reference(root, leaf);
        b.set_gc_root(root, GcRootKind::ThreadStack);
        b.set_root_pointer(leaf, root);
        (b.build(), root, leaf)
    }

    #[test]
    fn references_and_root_pointers() {
        let (snap, root, leaf) = linked_pair();
        assert_eq!(snap.instance_count(), 2);
        assert_eq!(snap.references(root), vec![leaf]);
        assert_eq!(snap.references(leaf), Vec::<InstanceId>::new());
        assert_eq!(snap.nearest_gc_root_pointer(root), Some(root));
        assert_eq!(snap.nearest_gc_root_pointer(leaf), Some(root));
        assert_eq!(snap.gc_root_kind(root), Some(GcRootKind::ThreadStack));
        assert_eq!(snap.gc_root_kind(leaf), None);
    }

    #[test]
    fn index_pass_runs_once() {
        let (snap, root, leaf) = linked_pair();
        snap.references(root);
        snap.references(leaf);
        snap.references(root);
        assert_eq!(snap.reference_index_passes(), 1);
    }

    #[test]
    fn forced_order_is_recorded() {
        let (snap, root, _) = linked_pair();
        snap.references(root);
        snap.nearest_gc_root_pointer(root);
        assert_eq!(snap.forced_order(), vec!["references", "gc_roots"]);
    }

    #[test]
    fn failed_pass_can_be_retried() {
        let (snap, root, _) = linked_pair();
        snap.fail_next_reference_pass();
        let panicked =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| snap.references(root)));
        assert!(panicked.is_err());
        // The failure consumed the flag; the next pass succeeds.
        assert_eq!(snap.references(root), vec![InstanceId(1)]);
        assert_eq!(snap.reference_index_passes(), 2);
    }

    #[test]
    fn unknown_instance_label_falls_back_to_id() {
        let (snap, _, _) = linked_pair();
        assert_eq!(snap.instance_label(InstanceId(99)), "#99");
    }
}
