//! Key-value store abstraction
//!
//! The counter core only needs `get`/`set`/`delete`/`list(prefix)` on
//! opaque byte values. Listing is paged: each page carries a continuation
//! token (the last key returned) and the next call resumes strictly after it,
//! so a scan is lazy and can be restarted at any page.
//!
//! Implementations:
//! - `InMemoryKvStore`: For unit tests and single-process deployments
//! - `LocalFsKvStore`: One file per key under a base directory
//! - `FaultyKvStore` (in `faulty.rs`): Failure injection wrapper for tests

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::future::Future;
use std::io::{ErrorKind, Result as IoResult};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Boxed future returned by every store operation
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = IoResult<T>> + Send + 'a>>;

/// One stored key and its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: Vec<u8>,
}

/// Result of a list operation
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Entries matching the prefix, in key order
    pub entries: Vec<KvEntry>,
    /// Pass back as `after` to fetch the next page; `None` on the last page
    pub continuation_token: Option<String>,
}

impl ListPage {
    fn from_entries(entries: Vec<KvEntry>, limit: usize) -> Self {
        let continuation_token = if entries.len() >= limit {
            entries.last().map(|e| e.key.clone())
        } else {
            None
        };
        ListPage {
            entries,
            continuation_token,
        }
    }
}

/// Key-value store abstraction trait
pub trait KvStore: Send + Sync + 'static {
    /// Read a value; `None` if the key is absent
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>>;

    /// Create or overwrite a value
    fn set<'a>(&'a self, key: &'a str, value: &'a [u8]) -> StoreFuture<'a, ()>;

    /// Remove a value. Deleting an absent key succeeds.
    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

    /// List up to `limit` entries under `prefix` with keys strictly after `after`
    fn list<'a>(
        &'a self,
        prefix: &'a str,
        after: Option<&'a str>,
        limit: usize,
    ) -> StoreFuture<'a, ListPage>;
}

// ============================================================================
// InMemoryKvStore
// ============================================================================

/// In-memory store backed by an ordered map
#[derive(Debug, Default)]
pub struct InMemoryKvStore {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Clone for InMemoryKvStore {
    fn clone(&self) -> Self {
        InMemoryKvStore {
            data: Arc::clone(&self.data),
        }
    }
}

impl KvStore for InMemoryKvStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move { Ok(self.data.read().get(key).cloned()) })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a [u8]) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.data.write().insert(key.to_string(), value.to_vec());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.data.write().remove(key);
            Ok(())
        })
    }

    fn list<'a>(
        &'a self,
        prefix: &'a str,
        after: Option<&'a str>,
        limit: usize,
    ) -> StoreFuture<'a, ListPage> {
        Box::pin(async move {
            let limit = limit.max(1);
            let start = match after {
                Some(after) if after >= prefix => Bound::Excluded(after.to_string()),
                _ => Bound::Included(prefix.to_string()),
            };
            let data = self.data.read();
            let entries: Vec<KvEntry> = data
                .range((start, Bound::Unbounded))
                .take_while(|(k, _)| k.starts_with(prefix))
                .take(limit)
                .map(|(k, v)| KvEntry {
                    key: k.clone(),
                    value: v.clone(),
                })
                .collect();
            Ok(ListPage::from_entries(entries, limit))
        })
    }
}

// ============================================================================
// LocalFsKvStore
// ============================================================================

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Filesystem store: key `a/b/c` lives at `<base>/a/b/c`
///
/// Each write goes to its own hidden temp file and is renamed into place, so
/// readers see either the old value or the new one, even with concurrent
/// writers on the same key.
#[derive(Debug, Clone)]
pub struct LocalFsKvStore {
    base_path: PathBuf,
}

impl LocalFsKvStore {
    pub fn new(base_path: PathBuf) -> Self {
        LocalFsKvStore { base_path }
    }

    /// Create the base directory if missing
    pub fn open(base_path: PathBuf) -> IoResult<Self> {
        std::fs::create_dir_all(&base_path)?;
        Ok(LocalFsKvStore::new(base_path))
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// Unique per write: `.<name>.<pid>.<seq>.tmp`
    fn temp_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), seq))
    }

    /// Collect every key under `dir`, skipping hidden temp files
    fn walk_keys(dir: &Path, base: &Path, prefix: &str, keys: &mut Vec<String>) -> IoResult<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');

            if path.is_dir() {
                Self::walk_keys(&path, base, prefix, keys)?;
            } else if path.is_file() && !hidden {
                let Ok(relative) = path.strip_prefix(base) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        Ok(())
    }
}

impl KvStore for LocalFsKvStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            match tokio::fs::read(self.full_path(key)).await {
                Ok(data) => Ok(Some(data)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e),
            }
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a [u8]) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let path = self.full_path(key);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let temp = Self::temp_path(&path);
            tokio::fs::write(&temp, value).await?;
            if let Err(e) = tokio::fs::rename(&temp, &path).await {
                let _ = tokio::fs::remove_file(&temp).await;
                return Err(e);
            }
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            match tokio::fs::remove_file(self.full_path(key)).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()), // Already deleted
                Err(e) => Err(e),
            }
        })
    }

    fn list<'a>(
        &'a self,
        prefix: &'a str,
        after: Option<&'a str>,
        limit: usize,
    ) -> StoreFuture<'a, ListPage> {
        Box::pin(async move {
            let limit = limit.max(1);
            let base = self.base_path.clone();
            let prefix_path = base.join(prefix);

            // Search the deepest existing directory the prefix names
            let search_dir = if prefix_path.is_dir() {
                prefix_path
            } else {
                prefix_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| base.clone())
            };
            if !search_dir.starts_with(&base) || !search_dir.is_dir() {
                return Ok(ListPage::default());
            }

            let mut keys = Vec::new();
            Self::walk_keys(&search_dir, &base, prefix, &mut keys)?;
            keys.sort();

            let mut entries = Vec::new();
            for key in keys
                .into_iter()
                .filter(|k| after.map_or(true, |after| k.as_str() > after))
            {
                if entries.len() == limit {
                    break;
                }
                // Deleted between walk and read: skip it
                match tokio::fs::read(self.full_path(&key)).await {
                    Ok(value) => entries.push(KvEntry { key, value }),
                    Err(e) if e.kind() == ErrorKind::NotFound => continue,
                    Err(e) => return Err(e),
                }
            }
            Ok(ListPage::from_entries(entries, limit))
        })
    }
}
