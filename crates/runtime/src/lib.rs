//! # Heapscope Runtime
//!
//! Execution collaborators shared by the navigation and index layers:
//! background task submission, interactive-thread dispatch, progress
//! indication and error display.
//!
//! The traits describe capabilities a host application already has (a UI
//! toolkit's event loop, its status bar, its notification area). The
//! implementations here are the defaults used by tests and headless hosts:
//! a fixed-size [`WorkerPool`], a dedicated-thread [`UiLoop`], and sinks
//! that report through the `log` facade.

mod display;
mod error;
mod exec;
mod progress;
pub mod test_support;
mod ui;

pub use display::{ErrorDisplay, LogErrorDisplay};
pub use error::{Result, RuntimeError};
pub use exec::{TaskExecutor, WorkerPool};
pub use progress::{LogProgress, ProgressHandle, ProgressSink, PROGRESS_MAX};
pub use ui::{UiDispatch, UiLoop};

/// Boxed fire-and-forget unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;
