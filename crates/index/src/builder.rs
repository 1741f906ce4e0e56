use crate::registry;
use crate::state::{IndexKind, Phase, SnapshotIndexes};
use crate::{IndexError, Result};
use heapscope_runtime::{ProgressSink, UiDispatch, PROGRESS_MAX};
use heapscope_snapshot::Snapshot;
use log::{error, info};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Single-flight builder for a snapshot's heap-wide indices.
///
/// `ensure_*` calls block until the requested index exists: the first
/// caller starts exactly one named builder thread and blocks on its
/// outcome; callers arriving while the build is in flight block alongside
/// it. Must never be called from the interactive thread — blocking it for
/// a multi-second index build would freeze the application, so that is a
/// fatal contract violation.
pub struct IndexBuilder {
    progress: Arc<dyn ProgressSink>,
    ui: Arc<dyn UiDispatch>,
}

impl IndexBuilder {
    pub fn new(progress: Arc<dyn ProgressSink>, ui: Arc<dyn UiDispatch>) -> Self {
        Self { progress, ui }
    }

    /// Make sure the snapshot's reference index exists, building it at
    /// most once regardless of concurrent callers.
    pub fn ensure_references<S: Snapshot>(&self, snapshot: &Arc<S>) -> Result<()> {
        self.assert_off_interactive_thread();
        let indexes = registry::indexes_for(snapshot);
        self.ensure(&indexes, IndexKind::References, snapshot)
    }

    /// Make sure the snapshot's nearest-GC-root index exists. GC-root
    /// computation depends on reference data, so the reference index is
    /// always completed first.
    pub fn ensure_gc_roots<S: Snapshot>(&self, snapshot: &Arc<S>) -> Result<()> {
        self.ensure_references(snapshot)?;
        let indexes = registry::indexes_for(snapshot);
        self.ensure(&indexes, IndexKind::GcRoots, snapshot)
    }

    fn assert_off_interactive_thread(&self) {
        assert!(
            !self.ui.is_ui_thread(),
            "index builds must never block the interactive thread"
        );
    }

    fn ensure<S: Snapshot>(
        &self,
        indexes: &Arc<SnapshotIndexes>,
        kind: IndexKind,
        snapshot: &Arc<S>,
    ) -> Result<()> {
        let mut flags = indexes.lock();
        match flags.phase(kind) {
            Phase::Built => Ok(()),
            Phase::Building => {
                // A build is in flight; block until it resolves. A failed
                // build is reported, not silently retried.
                drop(flags);
                await_outcome(indexes, kind)
            }
            Phase::Unbuilt => {
                flags.set_phase(kind, Phase::Building);
                flags.last_error = None;
                drop(flags);

                match self.spawn_builder(indexes, kind, snapshot) {
                    Ok(()) => {
                        // The starting caller blocks on completion
                        // alongside any waiters.
                        await_outcome(indexes, kind)
                    }
                    Err(err) => {
                        let mut flags = indexes.lock();
                        flags.set_phase(kind, Phase::Unbuilt);
                        flags.last_error = Some(err.to_string());
                        drop(flags);
                        indexes.notify_all();
                        Err(err)
                    }
                }
            }
        }
    }

    fn spawn_builder<S: Snapshot>(
        &self,
        indexes: &Arc<SnapshotIndexes>,
        kind: IndexKind,
        snapshot: &Arc<S>,
    ) -> Result<()> {
        let indexes = Arc::clone(indexes);
        let snapshot = Arc::clone(snapshot);
        let progress = Arc::clone(&self.progress);

        std::thread::Builder::new()
            .name(kind.thread_name().to_string())
            .spawn(move || {
                let started = Instant::now();
                let mut handle = progress.create(kind.label());
                handle.start(PROGRESS_MAX);
                handle.set_progress(0);

                // The reader builds the index lazily on first access of any
                // instance; touching a representative instance forces the
                // full excursion.
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    let dummy = snapshot.all_instances().next();
                    if let Some(id) = dummy {
                        match kind {
                            IndexKind::References => {
                                let _ = snapshot.references(id);
                            }
                            IndexKind::GcRoots => {
                                let _ = snapshot.nearest_gc_root_pointer(id);
                            }
                        }
                    }
                }));

                handle.finish();
                let elapsed_ms = started.elapsed().as_millis() as u64;

                let mut flags = indexes.lock();
                flags.last_build_ms = Some(elapsed_ms);
                match outcome {
                    Ok(()) => {
                        flags.set_phase(kind, Phase::Built);
                        info!("{} finished in {elapsed_ms}ms", kind.label());
                    }
                    Err(payload) => {
                        let message = panic_message(&payload);
                        error!("{} failed after {elapsed_ms}ms: {message}", kind.label());
                        flags.set_phase(kind, Phase::Unbuilt);
                        flags.last_error = Some(message);
                    }
                }
                drop(flags);
                indexes.notify_all();
            })
            .map_err(IndexError::from)?;

        Ok(())
    }
}

fn await_outcome(indexes: &Arc<SnapshotIndexes>, kind: IndexKind) -> Result<()> {
    let mut flags = indexes.lock();
    loop {
        match flags.phase(kind) {
            Phase::Built => return Ok(()),
            Phase::Building => {
                flags = indexes.wait(flags);
            }
            Phase::Unbuilt => {
                let message = flags
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "builder thread gave no failure detail".to_string());
                return Err(IndexError::BuildFailed(message));
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "builder thread panicked".to_string()
    }
}
