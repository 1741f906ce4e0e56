//! # Heapscope Browser
//!
//! Lazily-materialized tree navigation over the object graph of a heap
//! snapshot.
//!
//! ## Pipeline
//!
//! ```text
//! Tree widget
//!     │
//!     ├──> Node (placeholder published synchronously)
//!     │      └─> LazyMaterializer ──> worker ──> UI thread ──> children swap
//!     │
//!     ├──> grouping_info (collapse huge fan-out into containers)
//!     │
//!     └──> resolve_nearest_gc_root (walks the root-pointer chain,
//!            materializing synchronously along the way)
//! ```
//!
//! Nodes mirror a cyclic heap graph as a tree: every expansion creates
//! fresh child nodes, so identity is scoped to one expansion and parent
//! links never form cycles. A node's children are either entirely absent,
//! a transient placeholder, or a complete list — partial materialization is
//! never observable.

mod compute;
mod config;
mod error;
mod gc_root;
mod grouping;
mod lazy;
mod node;

pub use compute::{AllInstancesChildren, ChildrenComputer, ContainerChildren, ReferenceChildren};
pub use config::BrowserConfig;
pub use error::{BrowseError, Result};
pub use gc_root::resolve_nearest_gc_root;
pub use grouping::{container_ranges, grouping_info, GroupingInfo};
pub use lazy::LazyMaterializer;
pub use node::{ChildrenState, Node, RefreshCallback};
