//! Prelude module for gridslot-store.
//!
//! This module re-exports the most commonly used types and traits from
//! gridslot-store, making it easy to import everything you need with a single
//! `use` statement.

pub use crate::backend::{
    BlobBackend, BlobInfo, BlobWriter, NewBlob, ObjectStoreBackend, ObjectStoreClient,
};
pub use crate::providers::{
    LocalCredentials, LocalProvider, MemoryCredentials, MemoryProvider, Provider,
};
pub use crate::{
    BlobHandle, BlobId, BlobStore, Content, Dimensions, Error, OwnerRef, ProviderKind, Result,
    RetryConfig, StoreConfig,
};
