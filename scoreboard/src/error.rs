//! Failure modes of the scoreboard store

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The new snapshot could not be made durable; the board is unchanged
    #[error("failed to persist scoreboard to {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The durable snapshot exists but does not hold a valid board
    #[error("scoreboard file {path:?} is corrupt: {source}")]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The durable snapshot exists but could not be read
    #[error("failed to read scoreboard file {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The mutation task died before it could finish
    #[error("scoreboard update interrupted: {0}")]
    Interrupted(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
