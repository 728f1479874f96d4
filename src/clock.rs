//! Clock abstraction
//!
//! Hit handling reads `now` through this trait so tests can pin and advance
//! time explicitly.
//!
//! Implementations:
//! - `SystemClock`: Uses real system time
//! - `SimulatedClock`: Uses controlled virtual time

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Clock trait for time operations
pub trait Clock: Send + Sync + 'static {
    /// Current instant (UTC)
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock using real system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Simulated clock for deterministic testing
///
/// Time only advances when explicitly told to via `advance()` or `set()`.
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    /// Current virtual time in milliseconds since the epoch
    time_ms: Arc<AtomicI64>,
}

impl SimulatedClock {
    /// Create a new simulated clock starting at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        SimulatedClock {
            time_ms: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    /// Advance time by the given duration
    pub fn advance(&self, duration: Duration) {
        let ms = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        self.time_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Set time to a specific instant
    pub fn set(&self, instant: DateTime<Utc>) {
        self.time_ms
            .store(instant.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.time_ms.load(Ordering::SeqCst);
        DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
