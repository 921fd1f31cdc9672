use crate::meta::path::FullPath;
use crate::meta::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilerError {
    #[error("{0} not found")]
    NotFound(FullPath),

    /// A file occupies a path the write needs to be a directory.
    #[error("{0} is a file")]
    IsAFile(FullPath),

    #[error("parent folder not found: {0}")]
    ParentNotFound(FullPath),

    #[error("folder {0} is not empty")]
    DirectoryNotEmpty(FullPath),

    #[error("no write permission in folder {dir} for uid={uid} gid={gid}")]
    PermissionDenied { dir: FullPath, uid: u32, gid: u32 },

    #[error("{op} {path}: {source}")]
    Store {
        op: &'static str,
        path: FullPath,
        #[source]
        source: StoreError,
    },
}

impl FilerError {
    /// Wrap a backend failure; a missing entry surfaces as [`FilerError::NotFound`].
    pub(crate) fn from_store(op: &'static str, path: &FullPath, source: StoreError) -> Self {
        match source {
            StoreError::NotFound(_) => FilerError::NotFound(path.clone()),
            source => FilerError::Store {
                op,
                path: path.clone(),
                source,
            },
        }
    }
}
