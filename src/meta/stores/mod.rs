//! Concrete entry store backends.
pub mod localfs;
pub mod memory;

pub use localfs::LocalFsEntryStore;
pub use memory::InMemoryEntryStore;
