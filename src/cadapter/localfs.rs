//! Local directory object backend, used as a single-node volume store.

use crate::cadapter::client::{BackendResult, ObjectBackend};
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};

pub struct LocalFsBackend {
    root: PathBuf,
}

impl LocalFsBackend {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Object path under the root. Keys with anything but plain path
    /// segments would escape it and are refused.
    fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        let rel = Path::new(key);
        let plain = rel.components().all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !plain || key.contains('\\') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid object key {key:?}"),
            ));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ObjectBackend for LocalFsBackend {
    async fn put_object(&self, key: &str, data: &[u8]) -> BackendResult<()> {
        let path = self.path_for(key)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        let mut f = fs::File::create(path).await?;
        f.write_all(data).await?;
        f.flush().await?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)?).await {
            Ok(buf) => Ok(Some(buf)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    async fn delete_object(&self, key: &str) -> BackendResult<()> {
        match fs::remove_file(self.path_for(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Box::new(e)),
        }
    }
}
