//! Persistent store backends.
//!
//! - [`LmdbStore`]: durable on-disk store (heed/LMDB)
//! - [`InMemoryStore`]: process-local store with an optional quota

pub mod lmdb;
pub mod memory;

pub use lmdb::{LmdbStore, LmdbStoreError};
pub use memory::InMemoryStore;
