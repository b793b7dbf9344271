#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for blob store operations.
///
/// Use this target for logging save/read/delete dispatch and write failures.
pub const TRACING_TARGET_STORE: &str = "gridslot_store::store";

/// Tracing target for object store backend operations.
///
/// Use this target for logging object keys, metadata documents and multipart uploads.
pub const TRACING_TARGET_OBJECT: &str = "gridslot_store::object";

/// Tracing target for provider connections.
///
/// Use this target for logging provider construction and reachability checks.
pub const TRACING_TARGET_PROVIDER: &str = "gridslot_store::provider";

/// Tracing target for retry loops.
pub const TRACING_TARGET_RETRY: &str = "gridslot_store::retry";

pub mod backend;
mod config;
mod content;
mod error;
mod id;
pub mod providers;
mod retry;
mod store;

#[doc(hidden)]
pub mod prelude;

pub use config::{ProviderKind, StoreConfig};
pub use content::{Content, ContentBody, Dimensions};
pub use error::{Error, Result};
pub use id::BlobId;
pub use retry::RetryConfig;
pub use store::{BlobHandle, BlobStore, OwnerRef};
