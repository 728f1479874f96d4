//! Retention policy
//!
//! Pure functions deciding which bucket entries survive a write and how many
//! raw hit timestamps are kept. All instants are UTC.

use chrono::{DateTime, Datelike, Days, Months, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bucket start (ms since epoch) -> hit count
pub type BucketMap = BTreeMap<i64, u64>;

/// Time resolution of a bucket map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    Year,
    Month,
    Day,
}

/// Retention windows per resolution plus the timestamp list bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Years of yearly buckets kept
    pub yearly_window: u32,
    /// Months of monthly buckets kept
    pub monthly_window: u32,
    /// Days of daily buckets kept
    pub daily_window: u32,
    /// Most recent hit instants kept
    pub max_timestamps: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        RetentionConfig {
            yearly_window: 5,
            monthly_window: 48,
            daily_window: 360,
            max_timestamps: 1440,
        }
    }
}

impl RetentionConfig {
    /// Window size configured for `resolution`
    pub fn window(&self, resolution: Resolution) -> u32 {
        match resolution {
            Resolution::Year => self.yearly_window,
            Resolution::Month => self.monthly_window,
            Resolution::Day => self.daily_window,
        }
    }
}

/// Truncate `instant` to the start of its UTC year, month or day
pub fn bucket_start(instant: DateTime<Utc>, resolution: Resolution) -> DateTime<Utc> {
    let date = instant.date_naive();
    let date = match resolution {
        Resolution::Day => date,
        Resolution::Month => date
            .with_day(1)
            .expect("every month has a first day"),
        Resolution::Year => date
            .with_ordinal(1)
            .expect("every year has a first day"),
    };
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Keep only entries whose key is strictly after `min_timestamp`
pub fn prune(map: &BucketMap, min_timestamp: DateTime<Utc>) -> BucketMap {
    let min = min_timestamp.timestamp_millis();
    map.iter()
        .filter(|(&key, _)| key > min)
        .map(|(&key, &count)| (key, count))
        .collect()
}

/// Oldest bucket start still excluded from a window
///
/// `now` moves back `window` calendar units and is then truncated to the
/// start of that day, so every window rounds down to whole days. Month and
/// year arithmetic clamps to the last valid day (Mar 31 - 1 month = Feb 28/29).
pub fn min_timestamp_for(resolution: Resolution, now: DateTime<Utc>, window: u32) -> DateTime<Utc> {
    let shifted = match resolution {
        Resolution::Year => window
            .checked_mul(12)
            .and_then(|months| now.checked_sub_months(Months::new(months))),
        Resolution::Month => now.checked_sub_months(Months::new(window)),
        Resolution::Day => now.checked_sub_days(Days::new(u64::from(window))),
    };
    match shifted {
        Some(instant) => bucket_start(instant, Resolution::Day),
        // Window reaches past the representable range: nothing is old enough
        None => DateTime::<Utc>::MIN_UTC,
    }
}

/// Prepend `front` and drop the oldest entries beyond `len_max`
pub fn bounded_prepend(sequence: &[i64], front: i64, len_max: usize) -> Vec<i64> {
    let mut next = Vec::with_capacity((sequence.len() + 1).min(len_max));
    next.push(front);
    next.extend_from_slice(sequence);
    next.truncate(len_max);
    next
}
