//! Prelude module for gridslot-field.
//!
//! Re-exports the slot types together with the blob store types they are
//! used with.

pub use gridslot_store::{BlobId, BlobStore, Content, RetryConfig};

pub use crate::{
    Attachments, Cleanup, CleanupReport, Disposition, Download, Error, FieldKind, FileField,
    MemoryRecordStore, ModelSchema, Record, RecordKey, RecordStore, ReplaceOutcome, Result,
    SlotInput,
};
