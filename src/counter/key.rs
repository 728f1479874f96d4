//! Counter keys
//!
//! A counter is identified by `(namespace, resource)`. Both parts follow the
//! same shape: ASCII letters and digits, single hyphens allowed between two
//! alphanumerics, no leading or trailing hyphen.
//!
//! Store key format: `<prefix>/<namespace>/<resource>`
//!
//! Examples:
//! - `hits/octocat/hello-world`
//! - `hits/rust-lang/rust`

use super::error::KeyError;
use serde::{Deserialize, Serialize};

/// Maximum namespace length (GitHub username limit)
pub const NAMESPACE_LEN_MAX: usize = 39;
/// Maximum resource length (GitHub repository name limit)
pub const RESOURCE_LEN_MAX: usize = 100;

/// Validated `(namespace, resource)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CounterKey {
    namespace: String,
    resource: String,
}

impl CounterKey {
    /// Validate both parts and build a key
    pub fn new(namespace: &str, resource: &str) -> Result<Self, KeyError> {
        let namespace = validate_namespace(namespace)?;
        if !matches_pattern(resource, RESOURCE_LEN_MAX) {
            return Err(KeyError::InvalidResource);
        }
        Ok(CounterKey {
            namespace: namespace.to_string(),
            resource: resource.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Encode into a store key under `prefix`
    pub fn encode(&self, prefix: &str) -> String {
        format!("{}{}", namespace_prefix(prefix, &self.namespace), self.resource)
    }

    /// Decode a store key produced by [`CounterKey::encode`]
    ///
    /// Returns `None` for keys outside `prefix` or with invalid parts.
    pub fn decode(prefix: &str, key: &str) -> Option<CounterKey> {
        let rest = key.strip_prefix(prefix)?.strip_prefix('/')?;
        let (namespace, resource) = rest.split_once('/')?;
        CounterKey::new(namespace, resource).ok()
    }
}

impl std::fmt::Display for CounterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.resource)
    }
}

/// Validate a namespace on its own (used by listing)
pub fn validate_namespace(namespace: &str) -> Result<&str, KeyError> {
    if matches_pattern(namespace, NAMESPACE_LEN_MAX) {
        Ok(namespace)
    } else {
        Err(KeyError::InvalidNamespace)
    }
}

/// Store key prefix covering every resource of one namespace
///
/// Ends with `/` so `octo` never matches keys of `octocat`.
pub fn namespace_prefix(prefix: &str, namespace: &str) -> String {
    format!("{}/{}/", prefix, namespace)
}

fn matches_pattern(value: &str, len_max: usize) -> bool {
    let bytes = value.as_bytes();
    if bytes.is_empty() || bytes.len() > len_max || !bytes[0].is_ascii_alphanumeric() {
        return false;
    }
    bytes.iter().enumerate().all(|(i, &b)| match b {
        b'-' => bytes.get(i + 1).is_some_and(u8::is_ascii_alphanumeric),
        _ => b.is_ascii_alphanumeric(),
    })
}
