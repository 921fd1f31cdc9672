//! Filer test bed: in-memory store behind a lookup counter and failure
//! switches, plus the chunk doubles from `chuck::testing`.

use super::Filer;
use crate::chuck::chunk::FileChunk;
use crate::chuck::testing::{MapLocator, RecordingDeleter};
use crate::config::FilerConfig;
use crate::meta::entry::{Attr, Entry};
use crate::meta::path::FullPath;
use crate::meta::store::{EntryStore, StoreError};
use crate::meta::stores::InMemoryEntryStore;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts `find_entry` calls reaching the wrapped store, and fails inserts or
/// updates of chosen paths with a backend error.
#[derive(Default)]
pub(crate) struct CountingStore {
    inner: InMemoryEntryStore,
    finds: AtomicUsize,
    failing_inserts: Mutex<HashSet<String>>,
    failing_updates: Mutex<HashSet<String>>,
}

impl CountingStore {
    pub(crate) fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_inserts_at(&self, path: &str) {
        self.failing_inserts.lock().unwrap().insert(path.to_string());
    }

    pub(crate) fn fail_updates_at(&self, path: &str) {
        self.failing_updates.lock().unwrap().insert(path.to_string());
    }

    fn check(set: &Mutex<HashSet<String>>, path: &FullPath) -> Result<(), StoreError> {
        if set.lock().unwrap().contains(path.as_str()) {
            return Err(StoreError::Backend(format!("injected failure at {path}")));
        }
        Ok(())
    }
}

#[async_trait]
impl EntryStore for CountingStore {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn insert_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        Self::check(&self.failing_inserts, &entry.full_path)?;
        self.inner.insert_entry(entry).await
    }

    async fn update_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        Self::check(&self.failing_updates, &entry.full_path)?;
        self.inner.update_entry(entry).await
    }

    async fn find_entry(&self, path: &FullPath) -> Result<Entry, StoreError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_entry(path).await
    }

    async fn delete_entry(&self, path: &FullPath) -> Result<(), StoreError> {
        self.inner.delete_entry(path).await
    }

    async fn list_directory_entries(
        &self,
        dir: &FullPath,
        start_file_name: &str,
        inclusive: bool,
        limit: usize,
    ) -> Result<Vec<Entry>, StoreError> {
        self.inner
            .list_directory_entries(dir, start_file_name, inclusive, limit)
            .await
    }
}

pub(crate) struct TestBed {
    pub(crate) filer: Filer,
    pub(crate) store: Arc<CountingStore>,
    pub(crate) deleter: Arc<RecordingDeleter>,
}

impl TestBed {
    pub(crate) fn new() -> Self {
        Self::build(&FilerConfig::default(), RecordingDeleter::new())
    }

    pub(crate) fn with_config(cfg: &FilerConfig) -> Self {
        Self::build(cfg, RecordingDeleter::new())
    }

    pub(crate) fn with_failing_deletes(ids: &[&str]) -> Self {
        Self::build(&FilerConfig::default(), RecordingDeleter::new().failing(ids))
    }

    fn build(cfg: &FilerConfig, deleter: RecordingDeleter) -> Self {
        let store = Arc::new(CountingStore::default());
        let deleter = Arc::new(deleter);
        let filer = Filer::new(
            store.clone(),
            Arc::new(MapLocator::new("127.0.0.1:8080")),
            deleter.clone(),
            cfg,
        );
        Self {
            filer,
            store,
            deleter,
        }
    }

    pub(crate) fn into_filer(self) -> Filer {
        self.filer
    }
}

/// Regular file at `path` owned by root, one 1 KiB chunk per id.
pub(crate) fn file_with_chunks(path: &str, file_ids: &[&str]) -> Entry {
    let chunks = file_ids
        .iter()
        .enumerate()
        .map(|(i, fid)| FileChunk::new(*fid, i as i64 * 1024, 1024))
        .collect();
    Entry::new_file(path, Attr::new(0o644, 0, 0), chunks)
}
