//! Query and admin surface
//!
//! Thin pass-through to the counter store: list totals per namespace, fetch
//! one record, delete one record.

use super::error::CounterError;
use super::key::{validate_namespace, CounterKey};
use super::record::CounterRecord;
use crate::store::CounterStore;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::info;

/// Resource totals for one namespace, in listing order
///
/// Serializes as a JSON object whose key order is the listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountListing(pub Vec<(String, u64)>);

impl CountListing {
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(resource, _)| resource.as_str())
    }

    pub fn get(&self, resource: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(r, _)| r == resource)
            .map(|(_, total)| *total)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CountListing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (resource, total) in &self.0 {
            map.serialize_entry(resource, total)?;
        }
        map.end()
    }
}

/// Read and delete access to counter records
#[derive(Clone)]
pub struct QuerySurface {
    store: CounterStore,
}

impl QuerySurface {
    pub fn new(store: CounterStore) -> Self {
        QuerySurface { store }
    }

    /// Totals for every resource under `namespace`
    ///
    /// Ordered by descending total; equal totals by descending resource name.
    pub async fn list_counts(&self, namespace: &str) -> Result<CountListing, CounterError> {
        let namespace = validate_namespace(namespace)?;
        let mut counts: Vec<(String, u64)> = self
            .store
            .scan_namespace(namespace)
            .await?
            .into_iter()
            .map(|(key, record)| (key.resource().to_string(), record.total))
            .collect();
        counts.sort_by(|(ra, ta), (rb, tb)| tb.cmp(ta).then_with(|| rb.cmp(ra)));
        Ok(CountListing(counts))
    }

    /// The stored record, `None` if the key was never hit (or was deleted)
    pub async fn get_record(&self, key: &CounterKey) -> Result<Option<CounterRecord>, CounterError> {
        self.store.get(key).await
    }

    /// Remove the record; succeeds when it is already gone
    pub async fn delete_record(&self, key: &CounterKey) -> Result<(), CounterError> {
        self.store.delete(key).await?;
        info!(namespace = %key.namespace(), resource = %key.resource(), "Record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_serializes_in_order() {
        let listing = CountListing(vec![
            ("c".to_string(), 2),
            ("b".to_string(), 2),
            ("a".to_string(), 1),
        ]);
        let json = serde_json::to_string(&listing).unwrap();
        assert_eq!(json, r#"{"c":2,"b":2,"a":1}"#);
    }

    #[test]
    fn test_listing_lookup() {
        let listing = CountListing(vec![("repo".to_string(), 5)]);
        assert_eq!(listing.get("repo"), Some(5));
        assert_eq!(listing.get("missing"), None);
        assert_eq!(listing.resources().collect::<Vec<_>>(), vec!["repo"]);
    }
}
