use crate::registry;
use crate::state::Phase;
use heapscope_snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Diagnostic view of one snapshot's index build state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexHealth {
    pub references_built: bool,
    pub references_building: bool,
    pub gc_roots_built: bool,
    pub gc_roots_building: bool,
    pub last_build_ms: Option<u64>,
    pub last_error: Option<String>,
}

/// Current build state of `snapshot`'s indices.
pub fn index_health<S: Snapshot>(snapshot: &Arc<S>) -> IndexHealth {
    let indexes = registry::indexes_for(snapshot);
    let flags = indexes.lock();
    IndexHealth {
        references_built: flags.references == Phase::Built,
        references_building: flags.references == Phase::Building,
        gc_roots_built: flags.gc_roots == Phase::Built,
        gc_roots_building: flags.gc_roots == Phase::Building,
        last_build_ms: flags.last_build_ms,
        last_error: flags.last_error.clone(),
    }
}
