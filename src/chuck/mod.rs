//! Chunk references and their reclamation (chuck)
//!
//! Responsibilities:
//! - Model the chunk references a file entry holds ([`chunk::FileChunk`]).
//! - Work out which chunks a write or delete orphans ([`diff`]).
//! - Locate and delete orphaned chunks on the volume servers, best effort
//!   and bounded by timeouts ([`reclaim`]).
//!
//! Submodules:
//! - `chunk`: chunk identifiers and references
//! - `diff`: orphan computation
//! - `locator`: chunk location capability
//! - `deleter`: chunk deletion capability and the object-store deleter
//! - `reclaim`: batch reclamation
pub mod chunk;
pub mod deleter;
pub mod diff;
pub mod error;
pub mod locator;
pub mod reclaim;

#[cfg(test)]
pub(crate) mod testing;

pub use chunk::{FileChunk, FileId};
pub use deleter::{ChunkDeleter, ObjectChunkDeleter};
pub use error::ChunkError;
pub use locator::{ChunkLocation, ChunkLocator};
pub use reclaim::{ChunkReclaimer, ReclaimReport};
