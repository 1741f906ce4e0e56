//! # Heapscope Index
//!
//! Single-flight construction of the two heap-wide indices a snapshot
//! reader builds lazily: the reference index and the nearest-GC-root
//! index.
//!
//! Both indices take one excursion over the full instance set to build —
//! multi-second work on large dumps — so [`IndexBuilder`] guarantees at
//! most one builder thread per index per snapshot, no matter how many
//! navigation requests arrive concurrently. Everyone else blocks until the
//! shared build finishes. Build state is per snapshot, held in a
//! process-wide registry that never keeps a snapshot alive.

mod builder;
mod error;
mod health;
mod registry;
mod state;

pub use builder::IndexBuilder;
pub use error::{IndexError, Result};
pub use health::{index_health, IndexHealth};
