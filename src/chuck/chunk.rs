//! Chunk references held by file entries.
//!
//! A chunk is an immutable run of file content stored on a volume server. The
//! filer never reads chunk bytes; it just keeps the ordered list of
//! references per file version and decides when a referenced chunk can go.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, globally unique chunk identifier (`"<vid>,<needle>"` on SeaweedFS-style volumes).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChunk {
    pub file_id: FileId,
    /// Offset of this chunk within the file.
    pub offset: i64,
    pub size: u64,
    /// Write time in nanoseconds; later chunks win on overlap.
    #[serde(default)]
    pub mtime: i64,
}

impl FileChunk {
    pub fn new(file_id: impl Into<String>, offset: i64, size: u64) -> Self {
        Self {
            file_id: FileId::new(file_id),
            offset,
            size,
            mtime: 0,
        }
    }

    fn end(&self) -> u64 {
        (self.offset.max(0) as u64).saturating_add(self.size)
    }
}

/// Logical file size covered by the chunk list.
pub fn total_size(chunks: &[FileChunk]) -> u64 {
    chunks.iter().map(FileChunk::end).max().unwrap_or(0)
}
