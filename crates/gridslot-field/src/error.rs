//! Error types for slot and record operations.

/// Result type for all operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for slot and record operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Blob store failure.
    #[error(transparent)]
    Store(#[from] gridslot_store::Error),

    /// The persisted record changed since it was read.
    #[error("Record '{record}' was modified concurrently: expected revision {expected}, found {actual}")]
    Conflict {
        record: String,
        expected: u64,
        actual: u64,
    },

    /// No persisted record has this key.
    #[error("Record '{record}' not found")]
    RecordNotFound { record: String },

    /// None of the record's slots is backed by a store holding this blob.
    #[error("Blob '{id}' not found for record '{record}'")]
    BlobNotFound { record: String, id: String },

    /// The schema has no field with this name.
    #[error("Model '{model}' has no file field '{field}'")]
    UnknownField { model: String, field: String },

    /// The slot holds no blob.
    #[error("Field '{field}' of record '{record}' has no file associated with it")]
    EmptySlot { record: String, field: String },

    /// A path component would escape the media directory.
    #[error("Unsafe path component '{component}'")]
    UnsafePath { component: String },

    /// Local filesystem errors (media cache).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a revision conflict error.
    pub fn conflict(record: impl ToString, expected: u64, actual: u64) -> Self {
        Self::Conflict {
            record: record.to_string(),
            expected,
            actual,
        }
    }

    /// Create a record not found error.
    pub fn record_not_found(record: impl ToString) -> Self {
        Self::RecordNotFound {
            record: record.to_string(),
        }
    }

    /// Create an empty slot error.
    pub fn empty_slot(record: impl ToString, field: impl Into<String>) -> Self {
        Self::EmptySlot {
            record: record.to_string(),
            field: field.into(),
        }
    }

    /// Returns `true` for every flavour of "does not exist".
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Store(err) => err.is_not_found(),
            Self::RecordNotFound { .. } | Self::BlobNotFound { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the error is an optimistic concurrency conflict.
    #[inline]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
