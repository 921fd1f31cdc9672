//! In-memory entry store for development and tests.
//!
//! Entries are keyed by `(parent dir, name)` in an ordered map, so listing a
//! directory is a range scan the same way a key-value backend would do it.

use crate::meta::entry::Entry;
use crate::meta::path::FullPath;
use crate::meta::store::{EntryStore, StoreError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

type EntryKey = (String /*dir*/, String /*name*/);

fn key_of(path: &FullPath) -> EntryKey {
    let (dir, name) = path.dir_and_name();
    (dir.as_str().to_string(), name.to_string())
}

#[derive(Default)]
pub struct InMemoryEntryStore {
    entries: RwLock<BTreeMap<EntryKey, Entry>>,
}

impl InMemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl EntryStore for InMemoryEntryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let key = key_of(&entry.full_path);
        if entries.contains_key(&key) {
            return Err(StoreError::AlreadyExists(entry.full_path.clone()));
        }
        entries.insert(key, entry.clone());
        Ok(())
    }

    async fn update_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&key_of(&entry.full_path)) {
            Some(slot) => {
                *slot = entry.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(entry.full_path.clone())),
        }
    }

    async fn find_entry(&self, path: &FullPath) -> Result<Entry, StoreError> {
        self.entries
            .read()
            .await
            .get(&key_of(path))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.clone()))
    }

    async fn delete_entry(&self, path: &FullPath) -> Result<(), StoreError> {
        self.entries.write().await.remove(&key_of(path));
        Ok(())
    }

    async fn list_directory_entries(
        &self,
        dir: &FullPath,
        start_file_name: &str,
        inclusive: bool,
        limit: usize,
    ) -> Result<Vec<Entry>, StoreError> {
        let entries = self.entries.read().await;
        let dir = dir.as_str().to_string();
        let lower = (dir.clone(), start_file_name.to_string());
        let out = entries
            .range((Bound::Included(lower), Bound::Unbounded))
            .take_while(|((d, _), _)| *d == dir)
            // the root is stored under ("/", "") and is never its own child
            .filter(|((_, name), _)| !name.is_empty())
            .filter(|((_, name), _)| inclusive || name != start_file_name)
            .take(limit)
            .map(|(_, e)| e.clone())
            .collect();
        Ok(out)
    }
}
