//! Storage backends and the password identity provider.

pub mod identity;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
