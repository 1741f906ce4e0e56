//! # Heapscope Snapshot
//!
//! Snapshot-reader interface for heap navigation.
//!
//! The heavy lifting of parsing a heap dump lives outside this workspace;
//! this crate pins down the contract the navigation layers consume:
//! instance identity, outgoing references, and the precomputed
//! nearest-GC-root pointers. [`MemSnapshot`] is an in-memory implementation
//! used by tests and headless hosts.

mod instance;
mod mem;
mod reader;

pub use instance::{GcRootKind, InstanceId};
pub use mem::{MemSnapshot, MemSnapshotBuilder};
pub use reader::Snapshot;
