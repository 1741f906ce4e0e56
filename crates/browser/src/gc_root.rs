use crate::{Node, Result};
use heapscope_snapshot::Snapshot;
use log::debug;
use std::collections::HashSet;

/// Find the deepest tree node on the path from `start` up to (and
/// including) the node for its nearest GC root.
///
/// Walks the snapshot's nearest-GC-root-pointer chain (heap-graph hops)
/// and, in lockstep, descends the navigation tree, materializing children
/// synchronously where the chain leaves the already-expanded subtree. The
/// self-loop sentinel (an instance whose pointer is itself) terminates
/// successfully.
///
/// `Ok(None)` is a normal outcome, not an error: the instance may be
/// unreachable, or the chain may be inconsistent with the currently
/// displayed subtree (e.g. a grouping container that was since replaced).
/// A malformed chain that revisits an instance without ever reaching the
/// sentinel (a buggy reader) also resolves to `Ok(None)`.
///
/// Runs off the interactive thread; callers are expected to have forced
/// the snapshot's GC-root index beforehand (`heapscope-index`).
pub fn resolve_nearest_gc_root<S: Snapshot>(snapshot: &S, start: &Node) -> Result<Option<Node>> {
    let Some(mut instance) = start.instance() else {
        return Ok(None);
    };
    let mut node = start.clone();
    let mut visited = HashSet::from([instance]);

    loop {
        let Some(target) = snapshot.nearest_gc_root_pointer(instance) else {
            debug!("instance {instance} is unreachable from any GC root");
            return Ok(None);
        };
        if target == instance {
            // Self-loop sentinel: the current node is itself a GC root.
            return Ok(Some(node));
        }
        if !visited.insert(target) {
            debug!("root-pointer chain revisits {target}; malformed chain, giving up");
            return Ok(None);
        }

        // Follow one heap hop down the tree, descending through grouping
        // containers until the hop target's own node is reached. Children
        // are searched fresh at every descent: entering a container moves
        // to a different node with different children.
        loop {
            let children = node.ensure_children_sync()?;
            let Some(child) = children.iter().find(|c| c.contains_instance(target)) else {
                debug!(
                    "hop target {target} not present under '{}'; no path to a GC root",
                    node.name()
                );
                return Ok(None);
            };
            let matched_instance = child.instance() == Some(target);
            node = child.clone();
            if matched_instance {
                break;
            }
        }

        instance = target;
    }
}
