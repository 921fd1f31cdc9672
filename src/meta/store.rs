//! Entry store abstraction.
//!
//! The filer depends only on this capability; concrete backends live under
//! [`crate::meta::stores`] and are picked at runtime by [`crate::meta::factory`].

use super::entry::Entry;
use super::path::FullPath;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entry {0} not found")]
    NotFound(FullPath),

    #[error("entry {0} already exists")]
    AlreadyExists(FullPath),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Durable CRUD and listing over entries keyed by full path.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Fails with [`StoreError::AlreadyExists`] if the path is taken.
    async fn insert_entry(&self, entry: &Entry) -> Result<(), StoreError>;

    /// Replace an existing entry. Fails with [`StoreError::NotFound`] when absent.
    async fn update_entry(&self, entry: &Entry) -> Result<(), StoreError>;

    async fn find_entry(&self, path: &FullPath) -> Result<Entry, StoreError>;

    /// Removing an absent entry is not an error.
    async fn delete_entry(&self, path: &FullPath) -> Result<(), StoreError>;

    /// Immediate children of `dir` in name order, starting at `start_file_name`
    /// (an empty name starts at the first child), bounded by `limit`.
    async fn list_directory_entries(
        &self,
        dir: &FullPath,
        start_file_name: &str,
        inclusive: bool,
        limit: usize,
    ) -> Result<Vec<Entry>, StoreError>;
}
