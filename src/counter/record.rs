//! Counter record
//!
//! The value stored per counter key. Serialized as a 5-tuple
//! `[total, yearly, monthly, daily, timestamps]` both on the wire and in the
//! store.

use super::retention::BucketMap;
use serde::{Deserialize, Serialize};

type RecordTuple = (u64, BucketMap, BucketMap, BucketMap, Vec<i64>);

/// Per-key hit counts at every resolution
///
/// Treated as an immutable value: updates derive a new record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RecordTuple", into = "RecordTuple")]
pub struct CounterRecord {
    /// All-time hit count
    pub total: u64,
    /// Start-of-year (ms) -> hits
    pub yearly: BucketMap,
    /// Start-of-month (ms) -> hits
    pub monthly: BucketMap,
    /// Start-of-day (ms) -> hits
    pub daily: BucketMap,
    /// Hit instants (ms), newest first
    pub timestamps: Vec<i64>,
}

impl CounterRecord {
    /// The implicit value of a key that has never been hit
    pub fn zero() -> Self {
        Self::default()
    }
}

impl From<RecordTuple> for CounterRecord {
    fn from((total, yearly, monthly, daily, timestamps): RecordTuple) -> Self {
        CounterRecord {
            total,
            yearly,
            monthly,
            daily,
            timestamps,
        }
    }
}

impl From<CounterRecord> for RecordTuple {
    fn from(record: CounterRecord) -> Self {
        (
            record.total,
            record.yearly,
            record.monthly,
            record.daily,
            record.timestamps,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zero_record() {
        let zero = CounterRecord::zero();
        assert_eq!(zero.total, 0);
        assert!(zero.yearly.is_empty());
        assert!(zero.monthly.is_empty());
        assert!(zero.daily.is_empty());
        assert!(zero.timestamps.is_empty());
    }

    #[test]
    fn test_json_is_tuple_shaped() {
        let mut record = CounterRecord::zero();
        record.total = 2;
        record.yearly.insert(1_704_067_200_000, 2);
        record.monthly.insert(1_719_792_000_000, 2);
        record.daily.insert(1_721_347_200_000, 2);
        record.timestamps = vec![1_721_400_000_000, 1_721_390_000_000];

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!([
                2,
                {"1704067200000": 2},
                {"1719792000000": 2},
                {"1721347200000": 2},
                [1_721_400_000_000_i64, 1_721_390_000_000_i64]
            ])
        );

        let back: CounterRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_empty_record_json() {
        let value = serde_json::to_value(CounterRecord::zero()).unwrap();
        assert_eq!(value, json!([0, {}, {}, {}, []]));
    }
}
