//! Entry and attribute model.

use super::path::FullPath;
use crate::chuck::chunk::{FileChunk, total_size};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Directory bit of [`Attr::mode`].
pub const S_IFDIR: u32 = 0o040000;
/// Permission bits of [`Attr::mode`].
pub const PERM_MASK: u32 = 0o777;
/// Mode given to directories the filer creates implicitly.
pub const DEFAULT_DIR_MODE: u32 = S_IFDIR | 0o770;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    pub mtime: SystemTime,
    pub crtime: SystemTime,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

impl Attr {
    pub fn new(mode: u32, uid: u32, gid: u32) -> Self {
        let now = SystemTime::now();
        Self {
            mtime: now,
            crtime: now,
            mode,
            uid,
            gid,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.mode & S_IFDIR != 0
    }

    pub fn permissions(&self) -> u32 {
        self.mode & PERM_MASK
    }
}

/// A namespace node. Directories carry no chunks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub full_path: FullPath,
    pub attr: Attr,
    #[serde(default)]
    pub chunks: Vec<FileChunk>,
}

impl Entry {
    pub fn new_file(full_path: impl Into<FullPath>, attr: Attr, chunks: Vec<FileChunk>) -> Self {
        Self {
            full_path: full_path.into(),
            attr,
            chunks,
        }
    }

    /// Directory stamped with the current time and [`DEFAULT_DIR_MODE`].
    pub fn new_directory(full_path: impl Into<FullPath>, uid: u32, gid: u32) -> Self {
        Self {
            full_path: full_path.into(),
            attr: Attr::new(DEFAULT_DIR_MODE, uid, gid),
            chunks: Vec::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.attr.is_directory()
    }

    pub fn size(&self) -> u64 {
        total_size(&self.chunks)
    }
}
