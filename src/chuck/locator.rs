//! Where a chunk's bytes currently live.

use super::chunk::FileId;
use super::error::ChunkError;
use async_trait::async_trait;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkLocation {
    /// Volume server holding the chunk, `host:port`.
    pub server: String,
    pub file_id: FileId,
}

impl ChunkLocation {
    pub fn url(&self) -> String {
        format!("http://{}/{}", self.server, self.file_id)
    }
}

#[async_trait]
pub trait ChunkLocator: Send + Sync {
    async fn lookup_file_id(&self, file_id: &FileId) -> Result<ChunkLocation, ChunkError>;
}
