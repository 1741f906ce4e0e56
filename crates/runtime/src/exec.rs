use crate::{Result, RuntimeError, Task};
use log::{debug, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Background task submission.
///
/// No ordering guarantee across unrelated submissions; each submitted task
/// runs at least once. Tasks must never assume they run on the interactive
/// thread.
pub trait TaskExecutor: Send + Sync {
    fn submit(&self, task: Task);
}

enum Job {
    Run(Task),
    Shutdown,
}

/// Fixed-size pool of named worker threads draining a shared queue.
pub struct WorkerPool {
    tx: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Default worker count for children computation, matching the
    /// historical heap-walker processor.
    pub const DEFAULT_WORKERS: usize = 3;

    pub fn new(name: &str, workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let (tx, rx) = mpsc::channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        // Workers started before a failed spawn exit once `tx` is dropped.
        let handles = (0..workers)
            .map(|i| {
                let rx = Arc::clone(&rx);
                std::thread::Builder::new()
                    .name(format!("{name}-{i}"))
                    .spawn(move || worker_loop(&rx))
                    .map_err(RuntimeError::from)
            })
            .collect::<Result<Vec<_>>>()?;
        debug!("worker pool '{name}' started with {workers} threads");
        Ok(Self { tx, workers: handles })
    }
}

fn worker_loop(rx: &Mutex<Receiver<Job>>) {
    loop {
        let job = {
            let guard = match rx.lock() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            guard.recv()
        };
        match job {
            Ok(Job::Run(task)) => task(),
            Ok(Job::Shutdown) | Err(_) => return,
        }
    }
}

impl TaskExecutor for WorkerPool {
    fn submit(&self, task: Task) {
        if self.tx.send(Job::Run(task)).is_err() {
            warn!("task submitted to a worker pool that is shutting down");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for _ in &self.workers {
            let _ = self.tx.send(Job::Shutdown);
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}
