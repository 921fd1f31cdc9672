//! Chunk object store adapter (cAdapter)
//!
//! Submodules:
//! - `client`: object backend trait and the client used by the chunk deleter
//! - `localfs`: local-directory backend for single-node deployments and tests
pub mod client;
pub mod localfs;
