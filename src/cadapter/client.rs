//! High-level client API for the chunk object store
//!
//! Chunk bytes live on volume servers behind an [`ObjectBackend`]. The filer
//! only ever deletes through it, but put/get stay so the local tooling can
//! seed and inspect volumes.

use async_trait::async_trait;

pub type BackendResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[async_trait]
pub trait ObjectBackend: Send + Sync {
    async fn put_object(&self, key: &str, data: &[u8]) -> BackendResult<()>;

    async fn get_object(&self, key: &str) -> BackendResult<Option<Vec<u8>>>;

    /// Deleting a missing object succeeds.
    async fn delete_object(&self, key: &str) -> BackendResult<()>;
}

pub struct ObjectClient<B: ObjectBackend> {
    backend: B,
}

impl<B: ObjectBackend> ObjectClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub async fn put_object(&self, key: &str, data: &[u8]) -> BackendResult<()> {
        self.backend.put_object(key, data).await
    }

    pub async fn get_object(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        self.backend.get_object(key).await
    }

    pub async fn delete_object(&self, key: &str) -> BackendResult<()> {
        self.backend.delete_object(key).await
    }
}
