//! Update engine
//!
//! Applies one hit to a counter record with a single read followed by a
//! single write. The store offers no read-modify-write atomicity, so two
//! concurrent hits on the same key can both read the same record and the
//! later write wins, losing one increment. Hits on different keys never
//! interfere.

use super::error::CounterError;
use super::key::CounterKey;
use super::record::CounterRecord;
use super::retention::{
    bounded_prepend, bucket_start, min_timestamp_for, prune, BucketMap, Resolution,
    RetentionConfig,
};
use crate::store::CounterStore;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Applies hit events against the shared counter store
#[derive(Clone)]
pub struct UpdateEngine {
    store: CounterStore,
    retention: RetentionConfig,
}

impl UpdateEngine {
    pub fn new(store: CounterStore, retention: RetentionConfig) -> Self {
        UpdateEngine { store, retention }
    }

    /// Record one hit on `key` at `now` and return the record written
    ///
    /// Missing records start from the zero record. Any store failure (read
    /// or write) surfaces as `CounterError::StorageFailure`; a failed read
    /// means nothing was written.
    pub async fn apply_hit(
        &self,
        key: &CounterKey,
        now: DateTime<Utc>,
    ) -> Result<CounterRecord, CounterError> {
        let current = self.store.get(key).await?.unwrap_or_default();
        let next = next_record(&current, now, &self.retention);
        self.store.set(key, &next).await?;

        debug!(
            namespace = %key.namespace(),
            resource = %key.resource(),
            total = next.total,
            "Hit applied"
        );
        Ok(next)
    }
}

/// Derive the record that follows `current` after one hit at `now`
pub fn next_record(
    current: &CounterRecord,
    now: DateTime<Utc>,
    retention: &RetentionConfig,
) -> CounterRecord {
    let bump = |map: &BucketMap, resolution: Resolution| -> BucketMap {
        let mut next = map.clone();
        *next
            .entry(bucket_start(now, resolution).timestamp_millis())
            .or_insert(0) += 1;
        prune(
            &next,
            min_timestamp_for(resolution, now, retention.window(resolution)),
        )
    };

    CounterRecord {
        total: current.total.saturating_add(1),
        yearly: bump(&current.yearly, Resolution::Year),
        monthly: bump(&current.monthly, Resolution::Month),
        daily: bump(&current.daily, Resolution::Day),
        timestamps: bounded_prepend(
            &current.timestamps,
            now.timestamp_millis(),
            retention.max_timestamps,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_first_hit_from_zero() {
        let now = utc(2024, 7, 19, 15);
        let record = next_record(&CounterRecord::zero(), now, &RetentionConfig::default());

        assert_eq!(record.total, 1);
        assert_eq!(record.yearly.get(&utc(2024, 1, 1, 0).timestamp_millis()), Some(&1));
        assert_eq!(record.monthly.get(&utc(2024, 7, 1, 0).timestamp_millis()), Some(&1));
        assert_eq!(record.daily.get(&utc(2024, 7, 19, 0).timestamp_millis()), Some(&1));
        assert_eq!(record.timestamps, vec![now.timestamp_millis()]);
    }

    #[test]
    fn test_next_record_leaves_input_untouched() {
        let now = utc(2024, 7, 19, 15);
        let first = next_record(&CounterRecord::zero(), now, &RetentionConfig::default());
        let snapshot = first.clone();
        let second = next_record(&first, now, &RetentionConfig::default());

        assert_eq!(first, snapshot);
        assert_eq!(second.total, 2);
        assert_eq!(second.daily.values().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_old_buckets_pruned_on_write() {
        let retention = RetentionConfig {
            daily_window: 2,
            ..RetentionConfig::default()
        };
        let first = next_record(&CounterRecord::zero(), utc(2024, 7, 1, 12), &retention);
        // Window start is 2024-07-01 00:00, equal to the first bucket: dropped
        let later = next_record(&first, utc(2024, 7, 3, 12), &retention);

        assert_eq!(later.daily.len(), 1);
        assert!(later.daily.contains_key(&utc(2024, 7, 3, 0).timestamp_millis()));
        assert_eq!(later.monthly.len(), 1);
        assert_eq!(later.total, 2);
    }
}
