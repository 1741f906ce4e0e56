use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one object record in a heap snapshot.
///
/// Snapshot readers assign ids however they like (object address, record
/// offset, sequence number); the navigation layers only rely on equality
/// and hashing. Two ids from *different* snapshots are never comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of heap entry point a GC-rooted instance is anchored by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GcRootKind {
    ThreadStack,
    StaticField,
    JniHandle,
    Monitor,
    Other,
}

impl GcRootKind {
    /// Short label embedded as the parenthesized annotation on root node
    /// names, e.g. `Thread#3 (thread stack)`.
    pub fn label(&self) -> &'static str {
        match self {
            GcRootKind::ThreadStack => "thread stack",
            GcRootKind::StaticField => "static field",
            GcRootKind::JniHandle => "JNI handle",
            GcRootKind::Monitor => "monitor",
            GcRootKind::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn instance_id_display() {
        assert_eq!(InstanceId(42).to_string(), "#42");
    }

    #[test]
    fn gc_root_kind_labels_are_distinct() {
        let kinds = [
            GcRootKind::ThreadStack,
            GcRootKind::StaticField,
            GcRootKind::JniHandle,
            GcRootKind::Monitor,
            GcRootKind::Other,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert!(a.label() != b.label());
            }
        }
    }
}
