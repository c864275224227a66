use thiserror::Error;

use crate::types::ShardKey;

#[derive(Error, Debug)]
pub enum Error {
    #[error("chunk range [{min}, {max}) is empty or inverted")]
    InvalidChunkRange { min: ShardKey, max: ShardKey },

    #[error("capacity headroom must be below 100 percent, got {0}")]
    InvalidCapacityHeadroom(u8),

    #[error("invalid imbalance threshold {0:?}: expected \"adaptive\" or a non-negative integer")]
    InvalidThreshold(String),

    #[error("failed to parse topology snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("failed to read topology snapshot from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] envconfig::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
