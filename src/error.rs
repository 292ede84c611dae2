//! Error types for store operations.

use std::io;

use thiserror::Error;

/// Errors raised inside the store.
///
/// Only the write side (`set`, `remove`, `clear`) hands these to callers.
/// Reads recover from every variant and report the key as absent.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File system related error from a file-backed medium.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A value could not be serialized into an entry.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored record could not be decoded.
    #[error("Malformed entry: {0}")]
    MalformedEntry(String),

    /// An obfuscated record could not be reversed.
    #[error("Obfuscation error: {0}")]
    Obfuscation(String),

    /// The requested real storage medium cannot be used.
    #[error("Storage medium unavailable: {0}")]
    MediumUnavailable(String),

    /// A browser storage call failed after the medium was bound, e.g. a
    /// quota error on `setItem`.
    #[cfg(feature = "wasm")]
    #[error("Web storage error: {0}")]
    WebStorage(String),

    /// Store options could not be parsed.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = StoreError::MalformedEntry("missing value".into());
        assert_eq!(err.to_string(), "Malformed entry: missing value");

        let err = StoreError::MediumUnavailable("localStorage".into());
        assert_eq!(err.to_string(), "Storage medium unavailable: localStorage");
    }

    #[cfg(feature = "wasm")]
    #[test]
    fn test_web_storage_is_distinct_from_unavailable() {
        let err = StoreError::WebStorage("setItem: QuotaExceededError".into());
        assert_eq!(err.to_string(), "Web storage error: setItem: QuotaExceededError");
        assert!(!matches!(err, StoreError::MediumUnavailable(_)));
    }

    #[test]
    fn test_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
