//! Error types and utilities for blob store operations.

/// Result type for all blob store operations in this crate.
///
/// This is a convenience type alias that defaults to using [`Error`] as the error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The identifier does not name a blob in the collection.
    #[error("Blob '{id}' not found in collection '{collection}'")]
    NotFound { collection: String, id: String },

    /// A streaming write failed while copying chunks into the write handle.
    #[error("Failed to write blob '{filename}': {reason}")]
    WriteFailure { filename: String, reason: String },

    /// The string is not a valid blob identifier.
    #[error("Invalid blob identifier '{value}': {reason}")]
    InvalidId { value: String, reason: String },

    /// The name has no final path segment to use as a filename.
    #[error("Invalid blob name '{name}': no filename segment")]
    InvalidName { name: String },

    /// Metadata document (de)serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local I/O errors (content readers, local provider setup).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic backend operation error with context.
    #[error("Storage operation failed: {operation} - {details}")]
    Operation {
        operation: String,
        details: String,
        retryable: bool,
    },
}

impl Error {
    /// Create a not found error for `id` in `collection`.
    pub fn not_found(collection: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.to_string(),
        }
    }

    /// Create a write failure error.
    pub fn write_failure(filename: impl Into<String>, reason: impl ToString) -> Self {
        Self::WriteFailure {
            filename: filename.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid identifier error.
    pub fn invalid_id(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidId {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid name error.
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName { name: name.into() }
    }

    /// Create a non-retryable operation error with context.
    pub fn operation(op: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Operation {
            operation: op.into(),
            details: details.into(),
            retryable: false,
        }
    }

    /// Create an operation error the caller may retry.
    pub fn transient(op: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Operation {
            operation: op.into(),
            details: details.into(),
            retryable: true,
        }
    }

    /// Returns `true` if the error means the blob does not exist.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the caller should retry this operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Operation { retryable, .. } => *retryable,
            Self::Io(_) => true,
            _ => false,
        }
    }

    /// Convert an [`object_store::Error`] raised while handling `operation`.
    pub(crate) fn from_object_store(operation: &str, err: object_store::Error) -> Self {
        let retryable = !matches!(
            err,
            object_store::Error::NotFound { .. }
                | object_store::Error::PermissionDenied { .. }
                | object_store::Error::Unauthenticated { .. }
                | object_store::Error::AlreadyExists { .. }
                | object_store::Error::Precondition { .. }
        );
        Self::Operation {
            operation: operation.to_string(),
            details: err.to_string(),
            retryable,
        }
    }
}
