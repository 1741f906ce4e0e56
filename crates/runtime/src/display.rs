use log::error;

/// User-facing error notification, e.g. a dialog or toast in a real host.
pub trait ErrorDisplay: Send + Sync {
    fn display_error(&self, message: &str);
}

/// Error display over the `log` facade, for headless hosts.
#[derive(Default)]
pub struct LogErrorDisplay;

impl ErrorDisplay for LogErrorDisplay {
    fn display_error(&self, message: &str) {
        error!("{message}");
    }
}
