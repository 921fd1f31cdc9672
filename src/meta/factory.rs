//! Build an entry store from configuration.

use super::store::{EntryStore, StoreError};
use super::stores::{InMemoryEntryStore, LocalFsEntryStore};
use crate::config::{StoreConfig, StoreKind};
use std::sync::Arc;
use tracing::info;

pub async fn create_entry_store(cfg: &StoreConfig) -> Result<Arc<dyn EntryStore>, StoreError> {
    let store: Arc<dyn EntryStore> = match cfg.kind {
        StoreKind::Memory => Arc::new(InMemoryEntryStore::new()),
        StoreKind::LocalFs => {
            let root = cfg
                .root
                .as_ref()
                .ok_or_else(|| StoreError::Backend("localfs store requires a root".into()))?;
            Arc::new(LocalFsEntryStore::open(root).await?)
        }
    };
    info!(store = store.name(), "entry store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_picks_backend() {
        let mem = create_entry_store(&StoreConfig::default()).await.unwrap();
        assert_eq!(mem.name(), "memory");

        let tmp = tempfile::tempdir().unwrap();
        let cfg = StoreConfig {
            kind: StoreKind::LocalFs,
            root: Some(tmp.path().join("meta")),
        };
        let local = create_entry_store(&cfg).await.unwrap();
        assert_eq!(local.name(), "localfs");
        assert!(tmp.path().join("meta").is_dir());
    }

    #[tokio::test]
    async fn test_factory_rejects_localfs_without_root() {
        let cfg = StoreConfig {
            kind: StoreKind::LocalFs,
            root: None,
        };
        assert!(matches!(
            create_entry_store(&cfg).await,
            Err(StoreError::Backend(_))
        ));
    }
}
