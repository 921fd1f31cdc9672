//! Filer: entry CRUD over the hierarchical namespace
//!
//! Responsibilities:
//! - Materialize missing ancestor directories on every write, consulting and
//!   refreshing the directory cache along the way.
//! - Replace or insert the target entry, then reclaim the chunks the write
//!   left unreferenced.
//! - Delete entries, recursively on request, guarding non-empty directories.
//!
//! There is no global lock: concurrent writers materializing the same
//! directory race on the entry store, and the loser adopts the winner's entry.
//!
//! Submodules:
//! - `dir_cache`: directory cache capability, moka and no-op implementations
//! - `permission`: write permission policies
//! - `delete`: recursive deletion
//! - `error`: filer error type
pub mod delete;
pub mod dir_cache;
pub mod error;
pub mod permission;

#[cfg(test)]
pub(crate) mod testing;

use crate::chuck::chunk::FileId;
use crate::chuck::deleter::ChunkDeleter;
use crate::chuck::diff::{orphaned_chunks, unique_file_ids};
use crate::chuck::locator::ChunkLocator;
use crate::chuck::reclaim::ChunkReclaimer;
use crate::config::FilerConfig;
use crate::master::MasterClient;
use crate::meta::entry::Entry;
use crate::meta::path::FullPath;
use crate::meta::store::{EntryStore, StoreError};
use dir_cache::{directory_cache_from_config, ttl_for_level};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use dir_cache::{DirectoryCache, MokaDirectoryCache, NoopDirectoryCache};
pub use error::FilerError;
pub use permission::{AllowAll, UnixWritePolicy, WritePolicy};

pub struct Filer {
    store: Arc<dyn EntryStore>,
    directory_cache: Arc<dyn DirectoryCache>,
    reclaimer: Arc<ChunkReclaimer>,
    write_policy: Arc<dyn WritePolicy>,
    master: Option<Arc<MasterClient>>,
    list_page_size: usize,
}

impl Filer {
    pub fn new(
        store: Arc<dyn EntryStore>,
        locator: Arc<dyn ChunkLocator>,
        deleter: Arc<dyn ChunkDeleter>,
        cfg: &FilerConfig,
    ) -> Self {
        Self {
            store,
            directory_cache: directory_cache_from_config(&cfg.directory_cache),
            reclaimer: Arc::new(ChunkReclaimer::new(locator, deleter, &cfg.reclaim)),
            write_policy: Arc::new(AllowAll),
            master: None,
            list_page_size: cfg.list_page_size.max(1),
        }
    }

    /// Filer resolving chunk locations through `master`.
    pub fn with_master(
        store: Arc<dyn EntryStore>,
        master: Arc<MasterClient>,
        deleter: Arc<dyn ChunkDeleter>,
        cfg: &FilerConfig,
    ) -> Self {
        let mut filer = Self::new(store, master.clone(), deleter, cfg);
        filer.master = Some(master);
        filer
    }

    pub fn with_directory_cache(mut self, cache: Arc<dyn DirectoryCache>) -> Self {
        self.directory_cache = cache;
        self
    }

    pub fn with_write_policy(mut self, policy: Arc<dyn WritePolicy>) -> Self {
        self.write_policy = policy;
        self
    }

    pub fn set_store(&mut self, store: Arc<dyn EntryStore>) {
        self.store = store;
    }

    pub fn disable_directory_cache(&mut self) {
        self.directory_cache = Arc::new(NoopDirectoryCache);
    }

    pub fn store(&self) -> &Arc<dyn EntryStore> {
        &self.store
    }

    /// Current cluster coordinator, empty without a master client.
    pub async fn get_master(&self) -> String {
        match &self.master {
            Some(m) => m.get_master().await,
            None => String::new(),
        }
    }

    pub async fn keep_connected_to_master(&self, cancel: CancellationToken) {
        match &self.master {
            Some(m) => m.keep_connected_to_master(cancel).await,
            None => cancel.cancelled().await,
        }
    }

    /// Create or replace `entry`, creating every missing ancestor directory.
    pub async fn create_entry(&self, entry: &Entry) -> Result<(), FilerError> {
        let ancestors = entry.full_path.ancestors();
        let depth = ancestors.len();

        let mut parent = None;
        for (level, dir_path) in ancestors {
            let dir_entry = self
                .ensure_directory(&dir_path, level, entry.attr.uid, entry.attr.gid)
                .await?;
            if level == depth {
                parent = Some(dir_entry);
            }
        }
        let parent = parent.ok_or_else(|| FilerError::ParentNotFound(entry.full_path.clone()))?;

        if !self.write_policy.can_write(&parent, &entry.attr) {
            return Err(FilerError::PermissionDenied {
                dir: parent.full_path,
                uid: entry.attr.uid,
                gid: entry.attr.gid,
            });
        }

        let old_entry = self.store.find_entry(&entry.full_path).await.ok();
        let written = match old_entry {
            Some(_) => self.store.update_entry(entry).await,
            None => self.store.insert_entry(entry).await,
        };
        written.map_err(|source| FilerError::Store {
            op: "insert entry",
            path: entry.full_path.clone(),
            source,
        })?;
        info!(
            path = %entry.full_path,
            chunks = entry.chunks.len(),
            replaced = old_entry.is_some(),
            "entry created"
        );

        self.delete_chunks_if_not_new(old_entry.as_ref(), Some(entry))
            .await;
        Ok(())
    }

    /// Resolve the directory at `dir_path`, creating it when absent.
    async fn ensure_directory(
        &self,
        dir_path: &FullPath,
        level: usize,
        uid: u32,
        gid: u32,
    ) -> Result<Entry, FilerError> {
        let dir_entry = match self.directory_cache.get(dir_path).await {
            Some(cached) => {
                debug!(path = %dir_path, "found cached directory");
                cached
            }
            None => {
                debug!(path = %dir_path, "find uncached directory");
                match self.store.find_entry(dir_path).await {
                    Ok(found) => found,
                    Err(StoreError::NotFound(_)) => self.mkdir(dir_path, uid, gid).await?,
                    Err(source) => {
                        return Err(FilerError::Store {
                            op: "find directory",
                            path: dir_path.clone(),
                            source,
                        });
                    }
                }
            }
        };

        if !dir_entry.is_directory() {
            return Err(FilerError::IsAFile(dir_path.clone()));
        }

        self.directory_cache
            .set(dir_path, &dir_entry, ttl_for_level(level))
            .await;
        Ok(dir_entry)
    }

    async fn mkdir(&self, dir_path: &FullPath, uid: u32, gid: u32) -> Result<Entry, FilerError> {
        let dir = Entry::new_directory(dir_path.clone(), uid, gid);
        debug!(path = %dir_path, uid, gid, "create directory");
        match self.store.insert_entry(&dir).await {
            Ok(()) => Ok(dir),
            // another writer created it first, adopt theirs
            Err(StoreError::AlreadyExists(_)) => {
                self.store
                    .find_entry(dir_path)
                    .await
                    .map_err(|source| FilerError::Store {
                        op: "mkdir",
                        path: dir_path.clone(),
                        source,
                    })
            }
            Err(source) => Err(FilerError::Store {
                op: "mkdir",
                path: dir_path.clone(),
                source,
            }),
        }
    }

    /// Replace an entry's attributes and chunks as-is. Chunks dropped by the
    /// new version are not reclaimed here; writers that replace chunk lists go
    /// through [`Filer::create_entry`].
    pub async fn update_entry(&self, entry: &Entry) -> Result<(), FilerError> {
        self.store
            .update_entry(entry)
            .await
            .map_err(|e| FilerError::from_store("update entry", &entry.full_path, e))
    }

    pub async fn find_entry(&self, p: &FullPath) -> Result<Entry, FilerError> {
        self.store
            .find_entry(p)
            .await
            .map_err(|e| FilerError::from_store("find entry", p, e))
    }

    pub async fn list_directory_entries(
        &self,
        p: &FullPath,
        start_file_name: &str,
        inclusive: bool,
        limit: usize,
    ) -> Result<Vec<Entry>, FilerError> {
        let p = FullPath::new(p.as_str());
        self.store
            .list_directory_entries(&p, start_file_name, inclusive, limit)
            .await
            .map_err(|e| FilerError::from_store("list folder", &p, e))
    }

    /// Locate and delete a single chunk, logging any failure.
    pub async fn delete_file_by_file_id(&self, file_id: &FileId) {
        if let Err(e) = self.reclaimer.reclaim_one(file_id).await {
            warn!(file_id = %file_id, error = %e, "deleting chunk failed");
        }
    }

    pub(crate) async fn delete_chunks(&self, file_ids: Vec<FileId>) {
        if file_ids.is_empty() {
            return;
        }
        if let Some(report) = self.reclaimer.dispatch(file_ids).await {
            debug!(
                deleted = report.deleted.len(),
                failed = report.failed.len(),
                "chunks reclaimed"
            );
        }
    }

    /// Reclaim the chunks of `old_entry` that `new_entry` no longer references.
    /// A missing `new_entry` means the file is gone and every chunk goes.
    pub async fn delete_chunks_if_not_new(&self, old_entry: Option<&Entry>, new_entry: Option<&Entry>) {
        let Some(old_entry) = old_entry else {
            return;
        };
        let orphans = match new_entry {
            Some(new_entry) => orphaned_chunks(&old_entry.chunks, &new_entry.chunks),
            None => unique_file_ids(&old_entry.chunks),
        };
        self.delete_chunks(orphans).await;
    }
}

#[cfg(test)]
mod tests {
    use super::dir_cache::MokaDirectoryCache;
    use super::permission::UnixWritePolicy;
    use super::testing::{TestBed, file_with_chunks};
    use super::*;
    use crate::meta::entry::{Attr, S_IFDIR};

    #[tokio::test]
    async fn test_create_materializes_ancestors() {
        let bed = TestBed::new();
        let mut e = file_with_chunks("/a/b/c", &[]);
        e.attr.uid = 501;
        e.attr.gid = 20;
        bed.filer.create_entry(&e).await.unwrap();

        for p in ["/", "/a", "/a/b"] {
            let d = bed.filer.find_entry(&p.into()).await.unwrap();
            assert!(d.is_directory(), "{p} should be a directory");
            assert_eq!(d.attr.mode, S_IFDIR | 0o770);
            assert_eq!((d.attr.uid, d.attr.gid), (501, 20));
        }
        let c = bed.filer.find_entry(&"/a/b/c".into()).await.unwrap();
        assert!(!c.is_directory());
    }

    #[tokio::test]
    async fn test_file_in_ancestor_position_is_a_conflict() {
        let bed = TestBed::new();
        bed.filer
            .create_entry(&file_with_chunks("/a/b", &[]))
            .await
            .unwrap();

        let err = bed
            .filer
            .create_entry(&file_with_chunks("/a/b/c", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, FilerError::IsAFile(ref p) if p.as_str() == "/a/b"));
        assert!(matches!(
            bed.filer.find_entry(&"/a/b/c".into()).await,
            Err(FilerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_path_has_no_parent() {
        let bed = TestBed::new();
        let err = bed
            .filer
            .create_entry(&file_with_chunks("", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, FilerError::ParentNotFound(_)));
    }

    #[tokio::test]
    async fn test_recreate_reclaims_only_dropped_chunks() {
        let bed = TestBed::new();
        bed.filer
            .create_entry(&file_with_chunks("/f", &["1", "2", "3"]))
            .await
            .unwrap();
        assert!(bed.deleter.deleted_ids().is_empty());

        bed.filer
            .create_entry(&file_with_chunks("/f", &["2", "3", "4"]))
            .await
            .unwrap();
        assert_eq!(bed.deleter.deleted_ids(), vec!["1"]);

        let f = bed.filer.find_entry(&"/f".into()).await.unwrap();
        let ids: Vec<&str> = f.chunks.iter().map(|c| c.file_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "4"]);
    }

    #[tokio::test]
    async fn test_failed_mkdir_aborts_with_wrapped_error() {
        let bed = TestBed::new();
        bed.store.fail_inserts_at("/a");

        let err = bed
            .filer
            .create_entry(&file_with_chunks("/a/b/c", &["1"]))
            .await
            .unwrap_err();
        assert!(
            matches!(err, FilerError::Store { ref path, .. } if path.as_str() == "/a"),
            "unexpected error: {err}"
        );
        assert!(err.to_string().contains("/a"));
        for p in ["/a", "/a/b", "/a/b/c"] {
            assert!(bed.filer.find_entry(&p.into()).await.is_err(), "{p} should not exist");
        }
    }

    #[tokio::test]
    async fn test_failed_replace_reclaims_nothing() {
        let bed = TestBed::new();
        bed.filer
            .create_entry(&file_with_chunks("/f", &["1", "2"]))
            .await
            .unwrap();
        bed.store.fail_updates_at("/f");

        let err = bed
            .filer
            .create_entry(&file_with_chunks("/f", &["3"]))
            .await
            .unwrap_err();
        assert!(matches!(err, FilerError::Store { .. }));
        assert!(bed.deleter.deleted_ids().is_empty());

        let f = bed.filer.find_entry(&"/f".into()).await.unwrap();
        assert_eq!(f.chunks.len(), 2);
    }

    #[tokio::test]
    async fn test_reclamation_failure_does_not_fail_write() {
        let bed = TestBed::with_failing_deletes(&["1"]);
        bed.filer
            .create_entry(&file_with_chunks("/f", &["1", "2"]))
            .await
            .unwrap();
        bed.filer
            .create_entry(&file_with_chunks("/f", &[]))
            .await
            .unwrap();
        assert_eq!(bed.deleter.deleted_ids(), vec!["2"]);
    }

    #[tokio::test]
    async fn test_update_entry_does_not_reclaim() {
        let bed = TestBed::new();
        bed.filer
            .create_entry(&file_with_chunks("/f", &["1"]))
            .await
            .unwrap();
        bed.filer
            .update_entry(&file_with_chunks("/f", &["9"]))
            .await
            .unwrap();
        assert!(bed.deleter.deleted_ids().is_empty());

        let err = bed
            .filer
            .update_entry(&file_with_chunks("/missing", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, FilerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_normalizes_trailing_slash() {
        let bed = TestBed::new();
        for p in ["/a/b/x", "/a/b/y", "/a/c"] {
            bed.filer
                .create_entry(&file_with_chunks(p, &[]))
                .await
                .unwrap();
        }
        let with_slash = bed
            .filer
            .list_directory_entries(&FullPath::new("/a/b/"), "", false, 10)
            .await
            .unwrap();
        let without = bed
            .filer
            .list_directory_entries(&FullPath::new("/a/b"), "", false, 10)
            .await
            .unwrap();
        assert_eq!(with_slash, without);
        assert_eq!(without.len(), 2);

        let root = bed
            .filer
            .list_directory_entries(&FullPath::new("/"), "", false, 10)
            .await
            .unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].full_path.as_str(), "/a");
    }

    #[tokio::test]
    async fn test_ancestor_lookups_are_cached() {
        let bed = TestBed::new();
        bed.filer
            .create_entry(&file_with_chunks("/a/b/one", &[]))
            .await
            .unwrap();
        let after_first = bed.store.finds();

        bed.filer
            .create_entry(&file_with_chunks("/a/b/two", &[]))
            .await
            .unwrap();
        // only the target lookup reaches the store
        assert_eq!(bed.store.finds() - after_first, 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_hits_store_every_time() {
        let mut bed = TestBed::new();
        bed.filer.disable_directory_cache();
        bed.filer
            .create_entry(&file_with_chunks("/a/b/one", &[]))
            .await
            .unwrap();
        let after_first = bed.store.finds();

        bed.filer
            .create_entry(&file_with_chunks("/a/b/two", &[]))
            .await
            .unwrap();
        // "/", "/a", "/a/b" and the target
        assert_eq!(bed.store.finds() - after_first, 4);
    }

    #[tokio::test]
    async fn test_cache_is_populated_by_create() {
        let cache = Arc::new(MokaDirectoryCache::new(100));
        let bed = TestBed::new();
        let filer = bed.into_filer().with_directory_cache(cache.clone());
        filer
            .create_entry(&file_with_chunks("/x/y/z", &[]))
            .await
            .unwrap();
        for p in ["/", "/x", "/x/y"] {
            assert!(cache.contains(&p.into()).await, "{p} should be cached");
        }
        assert!(!cache.contains(&"/x/y/z".into()).await);
    }

    #[tokio::test]
    async fn test_concurrent_creates_share_new_ancestors() {
        let bed = TestBed::new();
        let filer = Arc::new(bed.into_filer());
        let mut tasks = Vec::new();
        for i in 0..16 {
            let filer = filer.clone();
            tasks.push(tokio::spawn(async move {
                filer
                    .create_entry(&file_with_chunks(&format!("/race/dir/f{i}"), &[]))
                    .await
            }));
        }
        for t in tasks {
            t.await.unwrap().unwrap();
        }
        let listed = filer
            .list_directory_entries(&"/race/dir".into(), "", false, 100)
            .await
            .unwrap();
        assert_eq!(listed.len(), 16);
    }

    #[tokio::test]
    async fn test_write_policy_denies_without_inserting() {
        let bed = TestBed::new();
        let filer = bed.into_filer().with_write_policy(Arc::new(UnixWritePolicy));

        let mut owned = file_with_chunks("/home/alice/notes", &[]);
        owned.attr = Attr::new(0o644, 1000, 1000);
        filer.create_entry(&owned).await.unwrap();

        let mut intruder = file_with_chunks("/home/alice/evil", &[]);
        intruder.attr = Attr::new(0o644, 2000, 2000);
        let err = filer.create_entry(&intruder).await.unwrap_err();
        assert!(matches!(err, FilerError::PermissionDenied { uid: 2000, .. }));
        assert!(filer.find_entry(&"/home/alice/evil".into()).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_file_by_file_id() {
        let bed = TestBed::new();
        bed.filer.delete_file_by_file_id(&FileId::new("5,aa")).await;
        assert_eq!(bed.deleter.deleted_ids(), vec!["5,aa"]);
        assert!(bed.filer.get_master().await.is_empty());
    }
}
