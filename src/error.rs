//! # Loader Error Types
//!
//! Structured error handling for the batch-loading core using thiserror.
//! Every error kind surfaces to each caller awaiting an affected `load`;
//! nothing is silently swallowed and the core performs no retries itself.

use thiserror::Error;

/// Errors delivered to callers awaiting a `load`.
///
/// One flush outcome is broadcast to every pending request in that flush,
/// so the type is `Clone` and carries owned context rather than sources.
/// Absence of a value is not an error: single-valued loaders yield
/// `Option<V>` and multi-valued loaders yield an empty collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Batch execution failed for relation {relation}: {message}")]
    BatchFailed { relation: String, message: String },

    #[error("Batch function contract violation for relation {relation}: returned {actual} results for {expected} unique keys")]
    ContractViolation {
        relation: String,
        expected: usize,
        actual: usize,
    },

    #[error("Load cancelled: scope for relation {relation} was discarded before its flush completed")]
    Cancelled { relation: String },

    #[error("Batch flush for relation {relation} timed out after {timeout_ms}ms")]
    Timeout { relation: String, timeout_ms: u64 },
}

impl LoadError {
    /// Create a batch execution failure
    pub fn batch_failed(relation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BatchFailed {
            relation: relation.into(),
            message: message.into(),
        }
    }

    /// Create a contract violation for a misaligned batch result
    pub fn contract_violation(relation: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ContractViolation {
            relation: relation.into(),
            expected,
            actual,
        }
    }

    /// Create a cancellation error
    pub fn cancelled(relation: impl Into<String>) -> Self {
        Self::Cancelled {
            relation: relation.into(),
        }
    }

    /// Create a flush timeout error
    pub fn timeout(relation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            relation: relation.into(),
            timeout_ms,
        }
    }
}

/// Error type returned by batch function collaborators.
///
/// A failed batch invocation rejects the whole flush; per-key absence is
/// expressed through the result values, never through this type.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Backend error: {message}")]
    Backend { message: String },
}

impl BatchError {
    /// Create a backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

impl From<String> for BatchError {
    fn from(message: String) -> Self {
        BatchError::backend(message)
    }
}

/// Result type alias for load operations
pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_creation() {
        let failed = LoadError::batch_failed("author_by_id", "connection refused");
        assert!(matches!(failed, LoadError::BatchFailed { .. }));

        let violation = LoadError::contract_violation("author_by_id", 3, 2);
        assert!(matches!(
            violation,
            LoadError::ContractViolation {
                expected: 3,
                actual: 2,
                ..
            }
        ));

        let timeout = LoadError::timeout("reviews_by_book_id", 250);
        assert!(matches!(timeout, LoadError::Timeout { timeout_ms: 250, .. }));
    }

    #[test]
    fn test_error_display() {
        let failed = LoadError::batch_failed("author_by_id", "connection refused");
        let display = format!("{failed}");
        assert!(display.contains("Batch execution failed"));
        assert!(display.contains("author_by_id"));
        assert!(display.contains("connection refused"));

        let violation = LoadError::contract_violation("author_by_id", 3, 5);
        let display = format!("{violation}");
        assert!(display.contains("contract violation"));
        assert!(display.contains('3'));
        assert!(display.contains('5'));

        let cancelled = LoadError::cancelled("books_by_author_id");
        assert!(format!("{cancelled}").contains("discarded"));
    }

    #[test]
    fn test_batch_error_conversion() {
        let err: BatchError = "row store unavailable".to_string().into();
        assert!(matches!(err, BatchError::Backend { .. }));
        assert!(format!("{err}").contains("row store unavailable"));
    }

    #[test]
    fn test_load_error_equality_for_broadcast() {
        // The same flush outcome must compare equal across all receivers.
        let a = LoadError::batch_failed("r", "boom");
        let b = a.clone();
        assert_eq!(a, b);
    }
}
