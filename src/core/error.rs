//! Error types and handling for the privacy graph engine
//!
//! Every failure aborts the whole in-flight request: the engine performs no
//! local recovery, so these variants describe *why* a request failed rather
//! than how to resume it.

use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by storage adapters
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Main error type for the privacy graph engine
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed locator (bad path / identifier count), raised before any I/O
    #[error("Invalid locator: {0}")]
    Validation(String),

    /// A single-document locator resolved to nothing
    #[error("Document not found: {locator}")]
    NotFound {
        /// Canonical identity of the locator that missed
        locator: String,
    },

    /// Connectivity or query failure reported by a storage adapter
    #[error("{operation} failed for {locator}: {source}")]
    Backend {
        /// Adapter operation that failed (fetch_one, fetch_many)
        operation: &'static str,
        /// Canonical identity of the locator being resolved
        locator: String,
        /// Underlying adapter error
        #[source]
        source: StorageError,
    },

    /// The atomic apply of a change set failed and was rolled back
    #[error("Transaction aborted: {0}")]
    TransactionAborted(#[source] StorageError),

    /// Error raised by a user supplied access or deletion handler
    #[error(transparent)]
    Callback(anyhow::Error),

    /// A locator points back into its own ancestor chain
    #[error("Cycle detected: {locator} is already being resolved")]
    CycleDetected {
        /// Canonical identity of the repeated locator
        locator: String,
    },

    /// Recursion went deeper than the configured limit
    #[error("Traversal exceeded maximum depth of {max_depth}")]
    DepthExceeded {
        /// Configured depth limit
        max_depth: usize,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Errors reported by storage adapters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    /// The targeted document does not exist
    #[error("Document does not exist: {0}")]
    NotFound(String),

    /// A filter or query predicate could not be evaluated
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// An update payload could not be applied
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// The backend could not be reached
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Concurrent modification or precondition failure
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an adapter failure with the operation and locator it concerned
    pub fn backend(operation: &'static str, locator: impl Into<String>, source: StorageError) -> Self {
        Self::Backend {
            operation,
            locator: locator.into(),
            source,
        }
    }

    /// Check if this is a retryable error
    ///
    /// The engine itself never retries; this is a hint for callers that
    /// wrap requests in their own retry policy.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Backend {
                source: StorageError::Unavailable(_) | StorageError::Conflict(_),
                ..
            } | Error::TransactionAborted(StorageError::Unavailable(_) | StorageError::Conflict(_))
        )
    }

    /// Check if the failure stems from the caller's locators or handlers
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::NotFound { .. }
                | Error::Callback(_)
                | Error::CycleDetected { .. }
                | Error::DepthExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display_carries_context() {
        let err = Error::backend(
            "fetch_many",
            "message:gcs/g1/messages",
            StorageError::Unavailable("connection reset".into()),
        );
        let text = err.to_string();
        assert!(text.contains("fetch_many"));
        assert!(text.contains("gcs/g1/messages"));
        assert!(text.contains("connection reset"));
        assert!(err.is_retryable());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_callback_error_is_transparent() {
        let err = Error::Callback(anyhow::anyhow!("unknown data type: invoice"));
        assert_eq!(err.to_string(), "unknown data type: invoice");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_transaction_aborted_not_retryable_on_missing_document() {
        let err = Error::TransactionAborted(StorageError::NotFound("users/u9".into()));
        assert!(!err.is_retryable());
    }
}
