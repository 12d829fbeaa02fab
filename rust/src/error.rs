//! Error handling and result types for BPlusTreeIndex operations.
//!
//! Only configuration mistakes and broken internal invariants are errors. A
//! missing key is reported through return values (`deleted == false`, an
//! empty search result), never through this type.

use thiserror::Error;

/// Error type for B+ tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BPlusTreeError {
    /// The requested degree cannot support splitting and borrowing.
    #[error("invalid degree {degree} (minimum required: {min})")]
    InvalidDegree { degree: usize, min: usize },
    /// The rebalancing state machine or an arena lookup reached a state
    /// that a well-formed tree cannot produce.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// Reported by the diagnostic checks in `validation`.
    #[error("corrupted tree: {0}")]
    CorruptedTree(String),
    /// A node arena ran out of addressable slots.
    #[error("arena exhausted: {0}")]
    ArenaExhausted(String),
}

impl BPlusTreeError {
    /// Create an InvalidDegree error
    pub fn invalid_degree(degree: usize, min: usize) -> Self {
        Self::InvalidDegree { degree, min }
    }

    /// Create an InvariantViolation and log it.
    pub fn invariant_violation(context: &str, details: &str) -> Self {
        tracing::error!(context, details, "tree invariant violated");
        Self::InvariantViolation(format!("{}: {}", context, details))
    }

    /// Create a CorruptedTree error with context
    pub fn corrupted_tree(component: &str, details: &str) -> Self {
        Self::CorruptedTree(format!("{} corruption: {}", component, details))
    }

    /// Create an ArenaExhausted error with context
    pub fn arena_exhausted(arena: &str, slots: usize) -> Self {
        Self::ArenaExhausted(format!("{} arena is full at {} slots", arena, slots))
    }

    /// Check if this error is a configuration error
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::InvalidDegree { .. })
    }

    /// True for errors after which the tree should be treated as suspect.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation(_) | Self::CorruptedTree(_))
    }
}

/// Internal result type for tree operations
pub(crate) type TreeResult<T> = Result<T, BPlusTreeError>;

/// Public result type for tree operations that may fail
pub type BTreeResult<T> = Result<T, BPlusTreeError>;

/// Result type for tree modification operations
pub type ModifyResult<T> = Result<T, BPlusTreeError>;

/// Result type for tree construction
pub type InitResult<T> = Result<T, BPlusTreeError>;

/// Result extension trait for annotating errors at the public boundary
pub trait BTreeResultExt<T> {
    /// Prefix the error message with `context`.
    fn with_context(self, context: &str) -> BTreeResult<T>;

    /// Prefix the error message with the name of the failed operation.
    fn with_operation(self, operation: &str) -> BTreeResult<T>;
}

impl<T> BTreeResultExt<T> for Result<T, BPlusTreeError> {
    fn with_context(self, context: &str) -> BTreeResult<T> {
        self.map_err(|e| match e {
            BPlusTreeError::InvalidDegree { .. } => e,
            BPlusTreeError::InvariantViolation(msg) => {
                BPlusTreeError::InvariantViolation(format!("{}: {}", context, msg))
            }
            BPlusTreeError::CorruptedTree(msg) => {
                BPlusTreeError::CorruptedTree(format!("{}: {}", context, msg))
            }
            BPlusTreeError::ArenaExhausted(msg) => {
                BPlusTreeError::ArenaExhausted(format!("{}: {}", context, msg))
            }
        })
    }

    fn with_operation(self, operation: &str) -> BTreeResult<T> {
        self.with_context(&format!("operation '{}'", operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_degree_message() {
        let err = BPlusTreeError::invalid_degree(2, 3);
        assert!(err.is_configuration_error());
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "invalid degree 2 (minimum required: 3)");
    }

    #[test]
    fn test_with_operation_prefixes_message() {
        let result: BTreeResult<()> =
            Err(BPlusTreeError::InvariantViolation("leaf 3: missing".to_string()));
        let err = result.with_operation("delete").unwrap_err();
        assert_eq!(
            err,
            BPlusTreeError::InvariantViolation("operation 'delete': leaf 3: missing".to_string())
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_with_context_keeps_degree_errors_intact() {
        let result: BTreeResult<()> = Err(BPlusTreeError::invalid_degree(1, 3));
        assert_eq!(
            result.with_context("construction").unwrap_err(),
            BPlusTreeError::invalid_degree(1, 3)
        );
    }
}
