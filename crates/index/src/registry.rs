use crate::state::SnapshotIndexes;
use heapscope_snapshot::Snapshot;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

struct Entry {
    /// Weak so the registry never keeps a snapshot (and its multi-gigabyte
    /// backing data) alive.
    snapshot: Weak<dyn Snapshot>,
    indexes: Arc<SnapshotIndexes>,
}

/// Process-wide registry of per-snapshot index state, keyed by snapshot
/// allocation address. Dead entries are pruned on every access, so a
/// recycled address can never inherit a released snapshot's build state.
static REGISTRY: Lazy<Mutex<HashMap<usize, Entry>>> = Lazy::new(|| Mutex::new(HashMap::new()));

pub(crate) fn indexes_for<S: Snapshot>(snapshot: &Arc<S>) -> Arc<SnapshotIndexes> {
    let key = Arc::as_ptr(snapshot) as *const () as usize;
    let mut map = REGISTRY.lock().unwrap_or_else(|e| e.into_inner());
    map.retain(|_, entry| entry.snapshot.strong_count() > 0);

    if let Some(entry) = map.get(&key) {
        return Arc::clone(&entry.indexes);
    }

    let indexes = Arc::new(SnapshotIndexes::new());
    let strong: Arc<dyn Snapshot> = snapshot.clone();
    map.insert(
        key,
        Entry {
            snapshot: Arc::downgrade(&strong),
            indexes: Arc::clone(&indexes),
        },
    );
    indexes
}
