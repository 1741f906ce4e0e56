use crate::{BrowseError, Node};
use heapscope_runtime::{ErrorDisplay, TaskExecutor, UiDispatch};
use log::{debug, error};
use std::sync::Arc;

const OUT_OF_MEMORY_MSG: &str =
    "Not enough memory to display all the requested data. The heap view remains usable.";

/// Drives the placeholder/compute/replace cycle for children requests.
///
/// State machine per expansion request: Placeholder → Computing → Resolved.
/// The placeholder is installed synchronously before any computation is
/// scheduled, so a concurrent reader never observes an
/// unmaterialized-but-not-computing node. Re-entrant requests on the same
/// node are not deduplicated here; the tree widget requests children once
/// per expand.
pub struct LazyMaterializer {
    executor: Arc<dyn TaskExecutor>,
    ui: Arc<dyn UiDispatch>,
    display: Arc<dyn ErrorDisplay>,
}

impl LazyMaterializer {
    pub fn new(
        executor: Arc<dyn TaskExecutor>,
        ui: Arc<dyn UiDispatch>,
        display: Arc<dyn ErrorDisplay>,
    ) -> Self {
        Self {
            executor,
            ui,
            display,
        }
    }

    /// Request the children of `node`.
    ///
    /// Returns a one-element placeholder sequence immediately; the real
    /// children are computed on a worker through the node's own computer
    /// and swapped in from the interactive thread, after which the tree
    /// root's view-refresh hook fires. An out-of-memory computation leaves
    /// a single sentinel child and surfaces the condition through the
    /// error display.
    pub fn request_children(&self, node: &Node) -> Arc<[Node]> {
        let placeholder: Arc<[Node]> = Arc::from(vec![Node::progress(node)]);
        node.set_pending(Arc::clone(&placeholder));

        let node = node.clone();
        let executor = Arc::clone(&self.executor);
        let ui = Arc::clone(&self.ui);
        let display = Arc::clone(&self.display);

        // Bounce through the UI queue first so the expanded node can paint
        // its placeholder before the heavy computation is even scheduled.
        self.ui.run_later(Box::new(move || {
            executor.submit(Box::new(move || {
                let computed = node.compute_children_for_swap();
                let (children, oom) = match computed {
                    Ok(children) => (children, false),
                    Err(BrowseError::ResourceExhausted(detail)) => {
                        error!("children computation for '{}' ran out of memory: {detail}", node.name());
                        (vec![Node::out_of_memory(&node)], true)
                    }
                };
                debug!(
                    "computed {} children for '{}', publishing to the interactive thread",
                    children.len(),
                    node.name()
                );
                ui.run_later(Box::new(move || {
                    node.change_children(children);
                }));
                if oom {
                    display.display_error(OUT_OF_MEMORY_MSG);
                }
            }));
        }));

        placeholder
    }
}

impl Node {
    /// Run this node's children computer, for the asynchronous swap path.
    fn compute_children_for_swap(&self) -> crate::Result<Vec<Node>> {
        match self.computer() {
            Some(computer) => computer.compute_children(self),
            None => Ok(Vec::new()),
        }
    }
}
