use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurateError {
    /// Invalid configuration, surfaced before any file is touched.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Two losers would land on the same file name in the removed store.
    #[error("destination collision in removed store: {0}")]
    DestinationCollision(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),
}
