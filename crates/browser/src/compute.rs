use crate::grouping::{container_ranges, grouping_info};
use crate::{BrowserConfig, Node, Result};
use heapscope_snapshot::{InstanceId, Snapshot};
use log::trace;
use std::sync::Arc;

/// Computes the full child list for one node.
///
/// Implementations run either on a worker (asynchronous protocol) or
/// inline on the resolver path; they must not touch the UI. A computer may
/// recurse into further grouping for huge fan-out.
pub trait ChildrenComputer: Send + Sync {
    fn compute_children(&self, parent: &Node) -> Result<Vec<Node>>;
}

/// Children of an instance node: one node per outgoing reference, grouped
/// into containers when the fan-out exceeds the collapse threshold.
pub struct ReferenceChildren<S> {
    snapshot: Arc<S>,
    config: BrowserConfig,
}

impl<S: Snapshot> ReferenceChildren<S> {
    pub fn new(snapshot: Arc<S>, config: BrowserConfig) -> Arc<Self> {
        Arc::new(Self { snapshot, config })
    }
}

impl<S: Snapshot> ChildrenComputer for ReferenceChildren<S> {
    fn compute_children(&self, parent: &Node) -> Result<Vec<Node>> {
        let Some(id) = parent.instance() else {
            return Ok(Vec::new());
        };
        let refs = self.snapshot.references(id);
        trace!("instance {id} has {} outgoing references", refs.len());
        Ok(build_children(parent, refs, &self.snapshot, &self.config))
    }
}

/// Children of a grouping container: the instance nodes of its owned
/// sub-range, regrouped if the slice itself still exceeds the threshold.
pub struct ContainerChildren<S> {
    snapshot: Arc<S>,
    config: BrowserConfig,
}

impl<S: Snapshot> ContainerChildren<S> {
    pub fn new(snapshot: Arc<S>, config: BrowserConfig) -> Arc<Self> {
        Arc::new(Self { snapshot, config })
    }
}

impl<S: Snapshot> ChildrenComputer for ContainerChildren<S> {
    fn compute_children(&self, parent: &Node) -> Result<Vec<Node>> {
        let ids = parent.container_slice().map(<[InstanceId]>::to_vec);
        Ok(build_children(
            parent,
            ids.unwrap_or_default(),
            &self.snapshot,
            &self.config,
        ))
    }
}

/// Root computer: the full instance list of the snapshot, grouped.
pub struct AllInstancesChildren<S> {
    snapshot: Arc<S>,
    config: BrowserConfig,
}

impl<S: Snapshot> AllInstancesChildren<S> {
    pub fn new(snapshot: Arc<S>, config: BrowserConfig) -> Arc<Self> {
        Arc::new(Self { snapshot, config })
    }
}

impl<S: Snapshot> ChildrenComputer for AllInstancesChildren<S> {
    fn compute_children(&self, parent: &Node) -> Result<Vec<Node>> {
        let ids: Vec<InstanceId> = self.snapshot.all_instances().collect();
        Ok(build_children(parent, ids, &self.snapshot, &self.config))
    }
}

/// Shared child construction: plain instance nodes below the collapse
/// threshold, grouping containers above it.
fn build_children<S: Snapshot>(
    parent: &Node,
    ids: Vec<InstanceId>,
    snapshot: &Arc<S>,
    config: &BrowserConfig,
) -> Vec<Node> {
    if ids.len() <= config.collapse_unit_threshold {
        return ids
            .into_iter()
            .map(|id| instance_node(parent, id, snapshot, config))
            .collect();
    }

    let info = grouping_info(ids.len(), config);
    let collection: Arc<[InstanceId]> = ids.into();
    container_ranges(collection.len(), &info)
        .map(|range| {
            let name = format!("items {}-{}", range.start + 1, range.end);
            Node::container(
                parent,
                name,
                Arc::clone(&collection),
                range,
                ContainerChildren::new(Arc::clone(snapshot), config.clone())
                    as Arc<dyn ChildrenComputer>,
            )
        })
        .collect()
}

fn instance_node<S: Snapshot>(
    parent: &Node,
    id: InstanceId,
    snapshot: &Arc<S>,
    config: &BrowserConfig,
) -> Node {
    let label = snapshot.instance_label(id);
    let name = match snapshot.gc_root_kind(id) {
        Some(kind) => format!("{label} ({})", kind.label()),
        None => label,
    };
    Node::new_instance(
        parent,
        name,
        id,
        ReferenceChildren::new(Arc::clone(snapshot), config.clone()) as Arc<dyn ChildrenComputer>,
    )
}
