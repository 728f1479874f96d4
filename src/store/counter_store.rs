//! Typed counter store
//!
//! Encodes `CounterRecord`s with bincode under `<prefix>/<namespace>/<resource>`
//! on top of any `KvStore`. One instance is shared (cheaply cloned) by the
//! update engine and the query surface for the lifetime of the process.

use super::kv::KvStore;
use crate::counter::{namespace_prefix, CounterError, CounterKey, CounterRecord};
use std::io::{Error as IoError, ErrorKind};
use std::sync::Arc;
use tracing::warn;

/// Default key prefix for counter records
pub const DEFAULT_KEY_PREFIX: &str = "hits";

/// Entries fetched per list call while scanning a namespace
const SCAN_PAGE_SIZE: usize = 256;

/// Record-level facade over a shared `KvStore`
#[derive(Clone)]
pub struct CounterStore {
    kv: Arc<dyn KvStore>,
    prefix: String,
}

impl CounterStore {
    pub fn new(kv: Arc<dyn KvStore>, prefix: impl Into<String>) -> Self {
        CounterStore {
            kv,
            prefix: prefix.into(),
        }
    }

    /// Load the record for `key`, `None` if it was never written
    pub async fn get(&self, key: &CounterKey) -> Result<Option<CounterRecord>, CounterError> {
        let bytes = self
            .kv
            .get(&key.encode(&self.prefix))
            .await
            .map_err(|e| CounterError::storage("get", e))?;
        bytes
            .map(|b| decode(&b).map_err(|e| CounterError::storage("get", e)))
            .transpose()
    }

    /// Replace the record for `key`
    pub async fn set(&self, key: &CounterKey, record: &CounterRecord) -> Result<(), CounterError> {
        let bytes = encode(record).map_err(|e| CounterError::storage("set", e))?;
        self.kv
            .set(&key.encode(&self.prefix), &bytes)
            .await
            .map_err(|e| CounterError::storage("set", e))
    }

    /// Remove the record for `key`; absent keys succeed
    pub async fn delete(&self, key: &CounterKey) -> Result<(), CounterError> {
        self.kv
            .delete(&key.encode(&self.prefix))
            .await
            .map_err(|e| CounterError::storage("delete", e))
    }

    /// Every record under `namespace`, in store order
    ///
    /// Pages through the store until the continuation token runs out. Keys
    /// that do not decode as counter keys are skipped.
    pub async fn scan_namespace(
        &self,
        namespace: &str,
    ) -> Result<Vec<(CounterKey, CounterRecord)>, CounterError> {
        let prefix = namespace_prefix(&self.prefix, namespace);
        let mut records = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let page = self
                .kv
                .list(&prefix, after.as_deref(), SCAN_PAGE_SIZE)
                .await
                .map_err(|e| CounterError::storage("list", e))?;

            for entry in page.entries {
                let Some(key) = CounterKey::decode(&self.prefix, &entry.key) else {
                    warn!(key = %entry.key, "Skipping foreign key under counter prefix");
                    continue;
                };
                let record = decode(&entry.value).map_err(|e| CounterError::storage("list", e))?;
                records.push((key, record));
            }

            match page.continuation_token {
                Some(token) => after = Some(token),
                None => break,
            }
        }

        Ok(records)
    }
}

fn encode(record: &CounterRecord) -> Result<Vec<u8>, IoError> {
    bincode::serialize(record).map_err(|e| IoError::new(ErrorKind::InvalidData, e))
}

fn decode(bytes: &[u8]) -> Result<CounterRecord, IoError> {
    bincode::deserialize(bytes).map_err(|e| IoError::new(ErrorKind::InvalidData, e))
}
