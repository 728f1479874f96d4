//! Hot path benchmarks for the hit route.
//!
//! Run with: `cargo bench --bench hot_paths`
//! Compare baselines: `cargo bench --bench hot_paths -- --baseline main`
//!
//! Every hit validates a key, decodes a record, derives the next record
//! (three bucket maps pruned plus a bounded timestamp list) and encodes it
//! again. A record at steady state holds the full retention windows, so
//! that is what these measure.

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use hit_counter::counter::{min_timestamp_for, next_record, prune, Resolution};
use hit_counter::{CounterKey, CounterRecord, RetentionConfig};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 15, 12, 0, 0).unwrap()
}

/// A record after one hit per day for `days` days
fn saturated_record(days: i64, retention: &RetentionConfig) -> CounterRecord {
    let mut record = CounterRecord::zero();
    for day in 0..days {
        record = next_record(&record, start() + Duration::days(day), retention);
    }
    record
}

fn bench_next_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_record");
    group.throughput(Throughput::Elements(1));
    let retention = RetentionConfig::default();

    for days in [1, 30, 1441] {
        let record = saturated_record(days, &retention);
        let now = start() + Duration::days(days);
        group.bench_function(format!("days_{}", days), |b| {
            b.iter(|| next_record(black_box(&record), black_box(now), &retention))
        });
    }

    group.finish();
}

fn bench_prune(c: &mut Criterion) {
    let mut group = c.benchmark_group("prune");
    let retention = RetentionConfig::default();
    let record = saturated_record(1441, &retention);
    let now = start() + Duration::days(1441);

    for (name, resolution, buckets) in [
        ("yearly", Resolution::Year, &record.yearly),
        ("monthly", Resolution::Month, &record.monthly),
        ("daily", Resolution::Day, &record.daily),
    ] {
        let min = min_timestamp_for(resolution, now, retention.window(resolution));
        group.throughput(Throughput::Elements(buckets.len() as u64));
        group.bench_function(name, |b| b.iter(|| prune(black_box(buckets), min)));
    }

    group.finish();
}

fn bench_key_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_validation");
    group.throughput(Throughput::Elements(1));

    let long_namespace = "a-".repeat(19) + "a";
    let long_resource = "b-".repeat(49) + "b";
    group.bench_function("short", |b| {
        b.iter(|| CounterKey::new(black_box("octocat"), black_box("repo")))
    });
    group.bench_function("max_len", |b| {
        b.iter(|| CounterKey::new(black_box(&long_namespace), black_box(&long_resource)))
    });
    group.bench_function("invalid", |b| {
        b.iter(|| CounterKey::new(black_box("octo--cat"), black_box("repo")))
    });

    group.finish();
}

fn bench_record_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_codec");
    let record = saturated_record(1441, &RetentionConfig::default());
    let bytes = bincode::serialize(&record).unwrap();
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("encode", |b| {
        b.iter(|| bincode::serialize(black_box(&record)).unwrap())
    });
    group.bench_function("decode", |b| {
        b.iter(|| bincode::deserialize::<CounterRecord>(black_box(&bytes)).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_next_record,
    bench_prune,
    bench_key_validation,
    bench_record_codec
);
criterion_main!(benches);
