//! Which chunks a write leaves unreferenced.

use super::chunk::{FileChunk, FileId};
use std::collections::HashSet;

/// Identifiers referenced by `old` but not by `new`, in `old` order, each once.
///
/// Only identity matters: a chunk that moved or was repeated in `new` is kept.
pub fn orphaned_chunks(old: &[FileChunk], new: &[FileChunk]) -> Vec<FileId> {
    let keep: HashSet<&FileId> = new.iter().map(|c| &c.file_id).collect();
    let mut seen = HashSet::new();
    old.iter()
        .map(|c| &c.file_id)
        .filter(|id| !keep.contains(id) && seen.insert(*id))
        .cloned()
        .collect()
}

/// Every distinct identifier of `chunks`, in order.
pub fn unique_file_ids(chunks: &[FileChunk]) -> Vec<FileId> {
    orphaned_chunks(chunks, &[])
}
