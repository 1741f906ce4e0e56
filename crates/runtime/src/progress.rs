use log::info;
use std::time::{Duration, Instant};

/// Progress scale used by indeterminate heap-wide operations.
pub const PROGRESS_MAX: u64 = 100;

/// Factory for progress indicators.
pub trait ProgressSink: Send + Sync {
    fn create(&self, label: &str) -> Box<dyn ProgressHandle>;
}

/// One visible progress indicator. Hosts map this onto their progress
/// widget; implementations must tolerate `finish` without `start`.
pub trait ProgressHandle: Send {
    fn start(&mut self, max: u64);
    fn set_progress(&mut self, value: u64);
    fn finish(&mut self);
}

/// Progress sink reporting through the `log` facade.
///
/// Honors an initial grace delay: reports within the delay are suppressed
/// so short operations never flicker an indicator. Visibility is
/// re-evaluated on every report including `finish`, so an operation that
/// reports once up front and then runs long still becomes visible when it
/// completes past the grace. `finish` is always reported.
pub struct LogProgress {
    grace: Duration,
}

impl LogProgress {
    pub const DEFAULT_GRACE: Duration = Duration::from_millis(1000);

    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GRACE)
    }
}

impl ProgressSink for LogProgress {
    fn create(&self, label: &str) -> Box<dyn ProgressHandle> {
        Box::new(LogProgressHandle {
            label: label.to_string(),
            created: Instant::now(),
            grace: self.grace,
            visible: false,
            max: PROGRESS_MAX,
        })
    }
}

struct LogProgressHandle {
    label: String,
    created: Instant,
    grace: Duration,
    visible: bool,
    max: u64,
}

impl LogProgressHandle {
    /// Reveal the indicator once the grace has elapsed. Called from every
    /// report: an operation whose only reports bracket a long excursion
    /// still becomes visible at `finish`.
    fn reveal_if_due(&mut self) {
        if !self.visible && self.created.elapsed() >= self.grace {
            self.visible = true;
            info!("{}: started", self.label);
        }
    }
}

impl ProgressHandle for LogProgressHandle {
    fn start(&mut self, max: u64) {
        self.max = max;
        self.reveal_if_due();
    }

    fn set_progress(&mut self, value: u64) {
        self.reveal_if_due();
        if self.visible {
            info!("{}: {value}/{}", self.label, self.max);
        }
    }

    fn finish(&mut self) {
        self.reveal_if_due();
        info!(
            "{}: finished in {}ms",
            self.label,
            self.created.elapsed().as_millis()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(grace: Duration) -> LogProgressHandle {
        LogProgressHandle {
            label: "Computing References".to_string(),
            created: Instant::now(),
            grace,
            visible: false,
            max: PROGRESS_MAX,
        }
    }

    #[test]
    fn fast_operation_never_becomes_visible() {
        let mut h = handle(Duration::from_secs(3600));
        h.start(PROGRESS_MAX);
        h.set_progress(0);
        h.finish();
        assert!(!h.visible);
    }

    #[test]
    fn report_past_the_grace_is_visible_immediately() {
        let mut h = handle(Duration::ZERO);
        h.start(PROGRESS_MAX);
        assert!(h.visible);
    }

    #[test]
    fn slow_finish_reveals_an_indicator_that_only_reported_early() {
        // The builder's report pattern: start and one progress report up
        // front, then nothing until finish.
        let mut h = handle(Duration::from_millis(30));
        h.start(PROGRESS_MAX);
        h.set_progress(0);
        assert!(!h.visible);
        std::thread::sleep(Duration::from_millis(50));
        h.finish();
        assert!(h.visible);
    }
}
