//! Test doubles for the chunk collaborators.

use super::chunk::FileId;
use super::deleter::ChunkDeleter;
use super::error::ChunkError;
use super::locator::{ChunkLocation, ChunkLocator};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// Resolves every chunk to one server, except the ids told to fail or hang.
pub(crate) struct MapLocator {
    server: String,
    failing: HashSet<String>,
    hanging: HashSet<String>,
}

impl MapLocator {
    pub(crate) fn new(server: &str) -> Self {
        Self {
            server: server.to_string(),
            failing: HashSet::new(),
            hanging: HashSet::new(),
        }
    }

    pub(crate) fn failing(mut self, ids: &[&str]) -> Self {
        self.failing.extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub(crate) fn hanging(mut self, ids: &[&str]) -> Self {
        self.hanging.extend(ids.iter().map(|s| s.to_string()));
        self
    }
}

#[async_trait]
impl ChunkLocator for MapLocator {
    async fn lookup_file_id(&self, file_id: &FileId) -> Result<ChunkLocation, ChunkError> {
        if self.hanging.contains(file_id.as_str()) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(file_id.as_str()) {
            return Err(ChunkError::Backend(format!("no location for {file_id}")));
        }
        Ok(ChunkLocation {
            server: self.server.clone(),
            file_id: file_id.clone(),
        })
    }
}

/// Records every delete it is asked to perform.
#[derive(Default)]
pub(crate) struct RecordingDeleter {
    deleted: Mutex<Vec<ChunkLocation>>,
    failing: HashSet<String>,
}

impl RecordingDeleter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(mut self, ids: &[&str]) -> Self {
        self.failing.extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub(crate) fn deleted_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .deleted
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.file_id.to_string())
            .collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl ChunkDeleter for RecordingDeleter {
    async fn delete_from_volume_server(
        &self,
        location: &ChunkLocation,
        _auth_token: Option<&str>,
    ) -> Result<(), ChunkError> {
        if self.failing.contains(location.file_id.as_str()) {
            return Err(ChunkError::Backend("volume server refused".into()));
        }
        self.deleted.lock().unwrap().push(location.clone());
        Ok(())
    }
}
