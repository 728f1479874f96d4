//! Counter errors
//!
//! `InvalidKey` and `Unauthorized` are raised before any store access.
//! `StorageFailure` wraps whatever the store or the record codec reported.

use std::io::Error as IoError;

/// Which half of a counter key failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyError {
    /// Namespace is empty, too long, or has characters outside `[A-Za-z0-9-]`
    InvalidNamespace,
    /// Resource is empty, too long, or has characters outside `[A-Za-z0-9-]`
    InvalidResource,
}

impl std::fmt::Display for KeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyError::InvalidNamespace => write!(f, "Invalid namespace"),
            KeyError::InvalidResource => write!(f, "Invalid resource"),
        }
    }
}

impl std::error::Error for KeyError {}

/// Error type for counter operations
#[derive(Debug)]
pub enum CounterError {
    /// Namespace or resource failed its pattern
    InvalidKey(KeyError),
    /// Missing or incorrect shared secret
    Unauthorized,
    /// The store (or the record codec) failed
    StorageFailure {
        /// Store operation that failed: get, set, delete or list
        op: &'static str,
        source: IoError,
    },
}

impl CounterError {
    pub fn storage(op: &'static str, source: IoError) -> Self {
        CounterError::StorageFailure { op, source }
    }

    /// HTTP status for the JSON error body: 400 for client input, 500 otherwise
    pub fn status_code(&self) -> u16 {
        match self {
            CounterError::InvalidKey(_) | CounterError::Unauthorized => 400,
            CounterError::StorageFailure { .. } => 500,
        }
    }

    pub fn is_storage_failure(&self) -> bool {
        matches!(self, CounterError::StorageFailure { .. })
    }
}

impl std::fmt::Display for CounterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CounterError::InvalidKey(e) => write!(f, "{}", e),
            CounterError::Unauthorized => write!(f, "Invalid secret"),
            CounterError::StorageFailure { op, source } => {
                write!(f, "Storage failure during {}: {}", op, source)
            }
        }
    }
}

impl std::error::Error for CounterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CounterError::InvalidKey(e) => Some(e),
            CounterError::Unauthorized => None,
            CounterError::StorageFailure { source, .. } => Some(source),
        }
    }
}

impl From<KeyError> for CounterError {
    fn from(e: KeyError) -> Self {
        CounterError::InvalidKey(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn test_status_codes() {
        assert_eq!(CounterError::InvalidKey(KeyError::InvalidNamespace).status_code(), 400);
        assert_eq!(CounterError::Unauthorized.status_code(), 400);
        let err = CounterError::storage("get", IoError::new(ErrorKind::Other, "boom"));
        assert_eq!(err.status_code(), 500);
        assert!(err.is_storage_failure());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            CounterError::from(KeyError::InvalidResource).to_string(),
            "Invalid resource"
        );
        assert_eq!(CounterError::Unauthorized.to_string(), "Invalid secret");
        let err = CounterError::storage("set", IoError::new(ErrorKind::Other, "disk full"));
        assert_eq!(err.to_string(), "Storage failure during set: disk full");
    }
}
