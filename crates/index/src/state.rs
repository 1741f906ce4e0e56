use std::sync::{Condvar, Mutex, MutexGuard};

/// Build phase of one heap-wide index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Unbuilt,
    Building,
    Built,
}

/// Which of the two indices an operation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexKind {
    References,
    GcRoots,
}

impl IndexKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            IndexKind::References => "Computing References",
            IndexKind::GcRoots => "Computing GC Roots",
        }
    }

    pub(crate) fn thread_name(self) -> &'static str {
        match self {
            IndexKind::References => "references-builder",
            IndexKind::GcRoots => "gc-roots-builder",
        }
    }
}

#[derive(Debug)]
pub(crate) struct IndexFlags {
    pub references: Phase,
    pub gc_roots: Phase,
    pub last_build_ms: Option<u64>,
    pub last_error: Option<String>,
}

impl IndexFlags {
    pub(crate) fn phase(&self, kind: IndexKind) -> Phase {
        match kind {
            IndexKind::References => self.references,
            IndexKind::GcRoots => self.gc_roots,
        }
    }

    pub(crate) fn set_phase(&mut self, kind: IndexKind, phase: Phase) {
        match kind {
            IndexKind::References => self.references = phase,
            IndexKind::GcRoots => self.gc_roots = phase,
        }
    }
}

/// Shared build state of one snapshot's indices.
///
/// One mutual-exclusion domain per snapshot guards the
/// unbuilt/building/built transitions; the condvar broadcasts every
/// transition out of `Building` to the callers blocked on it.
pub(crate) struct SnapshotIndexes {
    flags: Mutex<IndexFlags>,
    changed: Condvar,
}

impl SnapshotIndexes {
    pub(crate) fn new() -> Self {
        Self {
            flags: Mutex::new(IndexFlags {
                references: Phase::Unbuilt,
                gc_roots: Phase::Unbuilt,
                last_build_ms: None,
                last_error: None,
            }),
            changed: Condvar::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, IndexFlags> {
        self.flags.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn wait<'a>(&self, guard: MutexGuard<'a, IndexFlags>) -> MutexGuard<'a, IndexFlags> {
        self.changed
            .wait(guard)
            .unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn notify_all(&self) {
        self.changed.notify_all();
    }
}
