use crate::{GcRootKind, InstanceId};

/// Read access to one heap snapshot.
///
/// Implemented by the external heap-dump reader. The two heavy queries,
/// [`references`](Snapshot::references) and
/// [`nearest_gc_root_pointer`](Snapshot::nearest_gc_root_pointer), are
/// backed by heap-wide indices the reader builds lazily on first access of
/// *any* instance. That first access can take seconds on large dumps, which
/// is why `heapscope-index` forces it exactly once per snapshot on a
/// dedicated builder thread instead of letting navigation requests pay the
/// cost at random.
pub trait Snapshot: Send + Sync + 'static {
    /// Total number of instances in the snapshot.
    fn instance_count(&self) -> usize;

    /// All instances, in snapshot order.
    fn all_instances(&self) -> Box<dyn Iterator<Item = InstanceId> + '_>;

    /// Outgoing references of an instance.
    fn references(&self, id: InstanceId) -> Vec<InstanceId>;

    /// Precomputed next hop toward the nearest GC root.
    ///
    /// Returns `Some(id)` itself for an instance that is directly a GC root
    /// (self-loop sentinel), `None` for an unreachable instance.
    fn nearest_gc_root_pointer(&self, id: InstanceId) -> Option<InstanceId>;

    /// GC root kind, for instances that are roots.
    fn gc_root_kind(&self, id: InstanceId) -> Option<GcRootKind>;

    /// Short display label, e.g. `java.lang.String#42`.
    fn instance_label(&self, id: InstanceId) -> String;
}
