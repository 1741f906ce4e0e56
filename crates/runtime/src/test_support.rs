//! Deterministic collaborator doubles shared by tests across the workspace.

use crate::{ErrorDisplay, ProgressHandle, ProgressSink, Task, TaskExecutor, UiDispatch};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::thread::ThreadId;

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Interactive-thread double with an explicit pump.
///
/// Tasks queue up until [`pump`](ManualUi::pump) runs them on the calling
/// thread; while pumping, that thread counts as the UI thread. Gives tests
/// full control over the placeholder/compute/publish interleaving.
#[derive(Default)]
pub struct ManualUi {
    queue: Mutex<VecDeque<Task>>,
    pumping_on: Mutex<Option<ThreadId>>,
}

impl ManualUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued, not yet pumped tasks.
    pub fn pending(&self) -> usize {
        lock_ignoring_poison(&self.queue).len()
    }

    /// Run all currently queued tasks (but not tasks they enqueue) on the
    /// calling thread. Returns the number of tasks run.
    pub fn pump(&self) -> usize {
        let batch: Vec<Task> = {
            let mut queue = lock_ignoring_poison(&self.queue);
            queue.drain(..).collect()
        };
        let count = batch.len();
        *lock_ignoring_poison(&self.pumping_on) = Some(std::thread::current().id());
        for task in batch {
            task();
        }
        *lock_ignoring_poison(&self.pumping_on) = None;
        count
    }

    /// Pump until the queue stays empty.
    pub fn pump_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.pump();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
    }
}

impl UiDispatch for ManualUi {
    fn run_later(&self, task: Task) {
        lock_ignoring_poison(&self.queue).push_back(task);
    }

    fn is_ui_thread(&self) -> bool {
        *lock_ignoring_poison(&self.pumping_on) == Some(std::thread::current().id())
    }
}

/// Executor running every task immediately on the submitting thread.
#[derive(Default)]
pub struct InlineExecutor;

impl TaskExecutor for InlineExecutor {
    fn submit(&self, task: Task) {
        task();
    }
}

/// Error display capturing messages for assertions.
#[derive(Default)]
pub struct RecordingDisplay {
    messages: Mutex<Vec<String>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        lock_ignoring_poison(&self.messages).clone()
    }
}

impl ErrorDisplay for RecordingDisplay {
    fn display_error(&self, message: &str) {
        lock_ignoring_poison(&self.messages).push(message.to_string());
    }
}

/// Progress sink that drops every report.
#[derive(Default)]
pub struct NullProgress;

struct NullHandle;

impl ProgressHandle for NullHandle {
    fn start(&mut self, _max: u64) {}
    fn set_progress(&mut self, _value: u64) {}
    fn finish(&mut self) {}
}

impl ProgressSink for NullProgress {
    fn create(&self, _label: &str) -> Box<dyn ProgressHandle> {
        Box::new(NullHandle)
    }
}
