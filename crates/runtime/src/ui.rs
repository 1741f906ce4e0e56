use crate::{Result, RuntimeError, Task};
use log::warn;
use std::sync::mpsc::{self, Sender};
use std::thread::{JoinHandle, ThreadId};

/// Dispatch onto the single interactive (UI) thread.
///
/// `run_later` is fire-and-forget and executes in submission order.
/// Node mutation and view refresh are only safe from this thread; the
/// index builder uses [`is_ui_thread`](UiDispatch::is_ui_thread) to assert
/// it is never blocked on.
pub trait UiDispatch: Send + Sync {
    fn run_later(&self, task: Task);
    fn is_ui_thread(&self) -> bool;
}

enum UiJob {
    Run(Task),
    Shutdown,
}

/// Headless interactive thread: one dedicated thread draining a queue in
/// submission order. Stands in for a UI toolkit's event loop.
pub struct UiLoop {
    tx: Sender<UiJob>,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl UiLoop {
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = mpsc::channel::<UiJob>();
        let (id_tx, id_rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("ui-loop".to_string())
            .spawn(move || {
                let _ = id_tx.send(std::thread::current().id());
                while let Ok(UiJob::Run(task)) = rx.recv() {
                    task();
                }
            })?;
        let thread_id = id_rx.recv().map_err(|_| RuntimeError::UiLoopStartup)?;
        Ok(Self {
            tx,
            thread_id,
            handle: Some(handle),
        })
    }
}

impl UiDispatch for UiLoop {
    fn run_later(&self, task: Task) {
        if self.tx.send(UiJob::Run(task)).is_err() {
            warn!("task dispatched to a ui loop that is shutting down");
        }
    }

    fn is_ui_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }
}

impl Drop for UiLoop {
    fn drop(&mut self) {
        let _ = self.tx.send(UiJob::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::mpsc::channel;
    use std::sync::Arc;

    #[test]
    fn tasks_run_in_submission_order_on_one_thread() {
        let ui = UiLoop::spawn().expect("ui loop");
        let (tx, rx) = channel();
        for i in 0..8 {
            let tx = tx.clone();
            ui.run_later(Box::new(move || {
                let _ = tx.send((i, std::thread::current().id()));
            }));
        }
        let mut seen = Vec::new();
        let mut threads = Vec::new();
        for _ in 0..8 {
            let (i, id) = rx
                .recv_timeout(std::time::Duration::from_secs(5))
                .expect("ui task");
            seen.push(i);
            threads.push(id);
        }
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
        assert!(threads.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn is_ui_thread_only_on_the_loop_thread() {
        let ui = Arc::new(UiLoop::spawn().expect("ui loop"));
        assert!(!ui.is_ui_thread());
        let (tx, rx) = channel();
        let ui2 = Arc::clone(&ui);
        ui.run_later(Box::new(move || {
            let _ = tx.send(ui2.is_ui_thread());
        }));
        assert!(rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("ui task"));
    }
}
