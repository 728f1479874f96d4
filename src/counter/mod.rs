//! Multi-resolution hit counters
//!
//! Every tracked `(namespace, resource)` key owns one `CounterRecord`:
//!
//! - **total**: all-time hit count
//! - **yearly / monthly / daily**: bucketed counts, pruned to their
//!   retention windows on every write
//! - **timestamps**: the most recent hit instants, newest first
//!
//! `UpdateEngine` applies hits; `QuerySurface` lists, reads and deletes.

mod engine;
mod error;
mod key;
mod query;
mod record;
mod retention;

pub use engine::{next_record, UpdateEngine};
pub use error::{CounterError, KeyError};
pub use key::{
    namespace_prefix, validate_namespace, CounterKey, NAMESPACE_LEN_MAX, RESOURCE_LEN_MAX,
};
pub use query::{CountListing, QuerySurface};
pub use record::CounterRecord;
pub use retention::{
    bounded_prepend, bucket_start, min_timestamp_for, prune, BucketMap, Resolution,
    RetentionConfig,
};
