use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowseError>;

#[derive(Error, Debug)]
pub enum BrowseError {
    /// Children computation ran out of its memory budget. Converted to a
    /// single sentinel child by the lazy materializer; propagated as-is on
    /// the synchronous resolver path.
    #[error("not enough memory to compute children: {0}")]
    ResourceExhausted(String),
}
