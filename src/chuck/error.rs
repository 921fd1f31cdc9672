use super::chunk::FileId;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("invalid file id {0}")]
    InvalidFileId(String),

    #[error("volume {0} not found")]
    VolumeNotFound(u32),

    #[error("{op} {file_id} timed out after {after:?}")]
    Timeout {
        op: &'static str,
        file_id: FileId,
        after: Duration,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend error: {0}")]
    Backend(String),
}
