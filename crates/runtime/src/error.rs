use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("ui loop thread exited during startup")]
    UiLoopStartup,
}
