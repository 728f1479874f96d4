//! Storage for counter records
//!
//! - `kv`: byte-level store trait with in-memory and filesystem backends
//! - `faulty`: failure injection wrapper for tests
//! - `counter_store`: typed record access shared by engine and queries

mod counter_store;
mod faulty;
mod kv;

pub use counter_store::{CounterStore, DEFAULT_KEY_PREFIX};
pub use faulty::{FaultConfig, FaultStats, FaultyKvStore};
pub use kv::{InMemoryKvStore, KvEntry, KvStore, ListPage, LocalFsKvStore, StoreFuture};

use crate::config::{StoreBackend, StoreConfig};
use std::io::Result as IoResult;
use std::sync::Arc;

/// Open the configured backend as a shared counter store
pub fn open(config: &StoreConfig) -> IoResult<CounterStore> {
    let kv: Arc<dyn KvStore> = match config.backend {
        StoreBackend::Memory => Arc::new(InMemoryKvStore::new()),
        StoreBackend::LocalFs => Arc::new(LocalFsKvStore::open(config.data_path.clone())?),
    };
    Ok(CounterStore::new(kv, config.key_prefix.clone()))
}
