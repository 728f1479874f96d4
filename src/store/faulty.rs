//! Failure-injecting store wrapper
//!
//! Wraps another `KvStore` and fails operations with seeded probabilities.
//! Same seed, same failure sequence.

use super::kv::{KvStore, ListPage, StoreFuture};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::io::{Error as IoError, ErrorKind};
use std::sync::Arc;

/// Failure probabilities per operation (0.0 - 1.0)
#[derive(Debug, Clone)]
pub struct FaultConfig {
    pub get_fail_prob: f64,
    pub set_fail_prob: f64,
    pub delete_fail_prob: f64,
    pub list_fail_prob: f64,
}

impl FaultConfig {
    /// No faults - for baseline testing
    pub fn no_faults() -> Self {
        FaultConfig {
            get_fail_prob: 0.0,
            set_fail_prob: 0.0,
            delete_fail_prob: 0.0,
            list_fail_prob: 0.0,
        }
    }

    /// Every operation fails
    pub fn always_fail() -> Self {
        FaultConfig {
            get_fail_prob: 1.0,
            set_fail_prob: 1.0,
            delete_fail_prob: 1.0,
            list_fail_prob: 1.0,
        }
    }

    /// Reads succeed, writes fail
    pub fn fail_writes() -> Self {
        FaultConfig {
            set_fail_prob: 1.0,
            delete_fail_prob: 1.0,
            ..Self::no_faults()
        }
    }
}

/// Counters for injected faults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultStats {
    pub get_attempts: u64,
    pub get_failures: u64,
    pub set_attempts: u64,
    pub set_failures: u64,
    pub delete_attempts: u64,
    pub delete_failures: u64,
    pub list_attempts: u64,
    pub list_failures: u64,
}

struct FaultState {
    rng: ChaCha8Rng,
    stats: FaultStats,
}

/// Store wrapper that fails operations at configured rates
#[derive(Clone)]
pub struct FaultyKvStore {
    inner: Arc<dyn KvStore>,
    config: FaultConfig,
    state: Arc<Mutex<FaultState>>,
}

#[derive(Clone, Copy)]
enum Op {
    Get,
    Set,
    Delete,
    List,
}

impl FaultyKvStore {
    pub fn new(inner: Arc<dyn KvStore>, seed: u64, config: FaultConfig) -> Self {
        FaultyKvStore {
            inner,
            config,
            state: Arc::new(Mutex::new(FaultState {
                rng: ChaCha8Rng::seed_from_u64(seed),
                stats: FaultStats::default(),
            })),
        }
    }

    pub fn stats(&self) -> FaultStats {
        self.state.lock().stats.clone()
    }

    /// Record the attempt and decide whether it fails
    fn roll(&self, op: Op) -> Result<(), IoError> {
        let prob = match op {
            Op::Get => self.config.get_fail_prob,
            Op::Set => self.config.set_fail_prob,
            Op::Delete => self.config.delete_fail_prob,
            Op::List => self.config.list_fail_prob,
        }
        .clamp(0.0, 1.0);

        let mut state = self.state.lock();
        let fail = state.rng.gen_bool(prob);
        let stats = &mut state.stats;
        let (attempts, failures, name) = match op {
            Op::Get => (&mut stats.get_attempts, &mut stats.get_failures, "get"),
            Op::Set => (&mut stats.set_attempts, &mut stats.set_failures, "set"),
            Op::Delete => (&mut stats.delete_attempts, &mut stats.delete_failures, "delete"),
            Op::List => (&mut stats.list_attempts, &mut stats.list_failures, "list"),
        };
        *attempts += 1;
        if fail {
            *failures += 1;
            return Err(IoError::new(
                ErrorKind::Other,
                format!("simulated {} failure", name),
            ));
        }
        Ok(())
    }
}

impl KvStore for FaultyKvStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            self.roll(Op::Get)?;
            self.inner.get(key).await
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a [u8]) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.roll(Op::Set)?;
            self.inner.set(key, value).await
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.roll(Op::Delete)?;
            self.inner.delete(key).await
        })
    }

    fn list<'a>(
        &'a self,
        prefix: &'a str,
        after: Option<&'a str>,
        limit: usize,
    ) -> StoreFuture<'a, ListPage> {
        Box::pin(async move {
            self.roll(Op::List)?;
            self.inner.list(prefix, after, limit).await
        })
    }
}
