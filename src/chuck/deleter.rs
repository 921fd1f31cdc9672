//! Best-effort chunk deletion on volume servers.

use super::error::ChunkError;
use super::locator::ChunkLocation;
use crate::cadapter::client::{ObjectBackend, ObjectClient};
use async_trait::async_trait;

#[async_trait]
pub trait ChunkDeleter: Send + Sync {
    async fn delete_from_volume_server(
        &self,
        location: &ChunkLocation,
        auth_token: Option<&str>,
    ) -> Result<(), ChunkError>;
}

/// Deletes chunks kept as objects under `<server>/<file_id>`.
pub struct ObjectChunkDeleter<B: ObjectBackend> {
    client: ObjectClient<B>,
}

impl<B: ObjectBackend> ObjectChunkDeleter<B> {
    pub fn new(client: ObjectClient<B>) -> Self {
        Self { client }
    }

    pub fn key_for(location: &ChunkLocation) -> String {
        format!("{}/{}", location.server, location.file_id)
    }
}

#[async_trait]
impl<B: ObjectBackend> ChunkDeleter for ObjectChunkDeleter<B> {
    async fn delete_from_volume_server(
        &self,
        location: &ChunkLocation,
        _auth_token: Option<&str>,
    ) -> Result<(), ChunkError> {
        self.client
            .delete_object(&Self::key_for(location))
            .await
            .map_err(|e| ChunkError::Backend(e.to_string()))
    }
}
