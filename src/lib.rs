//! Filer for SlayerFS: the hierarchical metadata layer in front of the chunk
//! store. Maps paths onto entries kept in a pluggable entry store, creates
//! missing parent directories on write and reclaims chunks that no entry
//! references anymore.

pub mod cadapter;
pub mod chuck;
pub mod config;
pub mod filer;
pub mod master;
pub mod meta;

pub use config::{ConfigError, FilerConfig};
pub use filer::{Filer, FilerError};
pub use meta::{Attr, Entry, EntryStore, FullPath, StoreError};
