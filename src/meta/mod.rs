//! Metadata model and entry stores
//!
//! Responsibilities:
//! - Define the namespace model: [`FullPath`], [`Entry`] and [`Attr`].
//! - Define the [`EntryStore`] capability the filer talks to, and ship the
//!   in-memory and local-directory backends.
//!
//! Submodules:
//! - `path`: path normalization and ancestor walk
//! - `entry`: entry and attribute model
//! - `store`: backend trait and error type
//! - `stores`: concrete backends
//! - `factory`: backend selection from configuration
pub mod entry;
pub mod factory;
pub mod path;
pub mod store;
pub mod stores;

pub use entry::{Attr, Entry};
pub use factory::create_entry_store;
pub use path::FullPath;
pub use store::{EntryStore, StoreError};
