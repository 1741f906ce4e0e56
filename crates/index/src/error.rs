use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    /// The underlying reader failed while forcing the index. The build
    /// state reverts to unbuilt, so a later caller retries from scratch;
    /// there are no automatic retries.
    #[error("index build failed: {0}")]
    BuildFailed(String),

    #[error("failed to spawn index builder thread: {0}")]
    Spawn(#[from] std::io::Error),
}
