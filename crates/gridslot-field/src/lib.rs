#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for slot replacement and cleanup.
///
/// Use this target for logging replace decisions, prior-blob deletes and the deletion hook.
pub const TRACING_TARGET_SLOT: &str = "gridslot_field::slot";

/// Tracing target for record store operations.
pub const TRACING_TARGET_RECORD: &str = "gridslot_field::record";

/// Tracing target for display, media and download helpers.
pub const TRACING_TARGET_RETRIEVAL: &str = "gridslot_field::retrieval";

mod attachments;
mod display;
mod download;
mod error;
mod field;
mod media;
mod record;
mod slot;

#[doc(hidden)]
pub mod prelude;

pub use attachments::Attachments;
pub use download::{Disposition, Download};
pub use error::{Error, Result};
pub use field::{FieldKind, FileField, ModelSchema};
pub use record::{MemoryRecordStore, Record, RecordKey, RecordStore};
pub use slot::{Cleanup, CleanupReport, ReplaceOutcome, SlotInput};

#[cfg(test)]
pub(crate) mod testing;
