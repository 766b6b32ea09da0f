pub mod base;
pub mod disk;
pub mod memory;

pub use base::{StorageBackend, StorageError};
pub use disk::DiskStorage;
pub use memory::MemoryStorage;
