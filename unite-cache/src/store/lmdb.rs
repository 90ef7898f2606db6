//! LMDB-backed persistent store.
//!
//! Uses the heed crate (Rust bindings for LMDB) as the durable backend for
//! the component cache. Keys and values are UTF-8 strings in a single
//! unnamed database, so the store can be shared by other users of the same
//! environment; the cache only ever touches its own namespace.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. The store uses:
//! - Read transactions for `get` and key enumeration
//! - One write transaction per `set` and `remove`

use std::path::Path;

use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions, MdbError};
use unite_core::{PersistentStore, StorageError, UniteResult};

/// Error type for LMDB store operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbStoreError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The memory map is full.
    #[error("LMDB map full writing {key} ({bytes} bytes)")]
    MapFull { key: String, bytes: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert LmdbStoreError to the shared storage taxonomy.
impl From<LmdbStoreError> for StorageError {
    fn from(e: LmdbStoreError) -> Self {
        match e {
            LmdbStoreError::EnvOpen(reason) | LmdbStoreError::DbOpen(reason) => {
                StorageError::Unavailable { reason }
            }
            LmdbStoreError::Transaction(reason) => StorageError::TransactionFailed { reason },
            LmdbStoreError::MapFull { key, bytes } => StorageError::QuotaExceeded { key, bytes },
            LmdbStoreError::Io(err) => StorageError::Io {
                reason: err.to_string(),
            },
        }
    }
}

impl From<LmdbStoreError> for unite_core::UniteError {
    fn from(e: LmdbStoreError) -> Self {
        StorageError::from(e).into()
    }
}

fn txn_error(e: heed::Error) -> LmdbStoreError {
    LmdbStoreError::Transaction(e.to_string())
}

/// LMDB-backed string store.
///
/// # Example
///
/// ```ignore
/// use unite_cache::LmdbStore;
/// use unite_core::PersistentStore;
///
/// let store = LmdbStore::new("/var/cache/unite", 64)?;
/// store.set("unite-ui-component-cache:card:42", r#"{"data":1,"version":"1.0.0","timestamp":0}"#)?;
/// ```
pub struct LmdbStore {
    /// The LMDB environment.
    env: Env,
    /// The main database (single unnamed database).
    db: Database<Str, Str>,
}

impl LmdbStore {
    /// Create a new LMDB store.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `max_size_mb` does not fit in a byte count
    /// - The directory cannot be created
    /// - LMDB environment cannot be opened
    /// - Database cannot be created
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbStoreError> {
        let map_size = max_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| {
                LmdbStoreError::EnvOpen(format!("map size of {} MB overflows", max_size_mb))
            })?;
        std::fs::create_dir_all(&path)?;

        // SAFETY: the environment is opened once per path by this process;
        // heed requires callers to uphold that LMDB invariant.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbStoreError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_error)?;

        let db: Database<Str, Str> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbStoreError::DbOpen(e.to_string()))?;

        wtxn.commit().map_err(txn_error)?;

        Ok(Self { env, db })
    }

    /// Number of keys in the database, across all namespaces.
    pub fn len(&self) -> Result<u64, LmdbStoreError> {
        let rtxn = self.env.read_txn().map_err(txn_error)?;
        self.db.len(&rtxn).map_err(txn_error)
    }

    /// Check if the database is empty.
    pub fn is_empty(&self) -> Result<bool, LmdbStoreError> {
        Ok(self.len()? == 0)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), LmdbStoreError> {
        let map_full = |e: &heed::Error| matches!(e, heed::Error::Mdb(MdbError::MapFull));
        let full = || LmdbStoreError::MapFull {
            key: key.to_string(),
            bytes: key.len() + value.len(),
        };

        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        if let Err(e) = self.db.put(&mut wtxn, key, value) {
            return Err(if map_full(&e) { full() } else { txn_error(e) });
        }
        wtxn.commit()
            .map_err(|e| if map_full(&e) { full() } else { txn_error(e) })
    }

    fn collect_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, LmdbStoreError> {
        let rtxn = self.env.read_txn().map_err(txn_error)?;

        let mut keys = Vec::new();
        let iter = self.db.prefix_iter(&rtxn, prefix).map_err(txn_error)?;
        for result in iter {
            match result {
                Ok((key, _)) => keys.push(key.to_string()),
                // A single undecodable key must not hide the rest.
                Err(_) => continue,
            }
        }

        Ok(keys)
    }
}

impl PersistentStore for LmdbStore {
    fn get(&self, key: &str) -> UniteResult<Option<String>> {
        let rtxn = self.env.read_txn().map_err(txn_error)?;
        let value = self
            .db
            .get(&rtxn, key)
            .map_err(txn_error)?
            .map(str::to_string);
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> UniteResult<()> {
        Ok(self.put(key, value)?)
    }

    fn remove(&self, key: &str) -> UniteResult<bool> {
        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        let deleted = self.db.delete(&mut wtxn, key).map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)?;
        Ok(deleted)
    }

    fn keys(&self) -> UniteResult<Vec<String>> {
        let rtxn = self.env.read_txn().map_err(txn_error)?;
        let iter = self.db.iter(&rtxn).map_err(txn_error)?;
        Ok(iter
            .filter_map(|result| result.ok().map(|(key, _)| key.to_string()))
            .collect())
    }

    fn keys_with_prefix(&self, prefix: &str) -> UniteResult<Vec<String>> {
        Ok(self.collect_keys_with_prefix(prefix)?)
    }
}
