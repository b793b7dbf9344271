//! Backing store abstraction.
//!
//! A [`BlobBackend`] is scoped to one collection and knows how to persist blob
//! bytes next to a [`BlobInfo`] metadata document. The [`BlobStore`] facade
//! only talks to this trait, so any backend can be injected at construction.
//!
//! # Implementations
//!
//! - [`ObjectStoreBackend`] - any [`object_store::ObjectStore`] (S3, local disk, memory)
//!
//! [`BlobStore`]: crate::BlobStore

mod client;
mod digest;
mod object;

use std::fmt;
use std::io;

use bytes::Bytes;
use futures::stream::BoxStream;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

pub use client::ObjectStoreClient;
pub(crate) use digest::Digest;
pub use object::ObjectStoreBackend;

use crate::{BlobId, Dimensions, Result};

/// Metadata document stored alongside every blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobInfo {
    /// Identifier of the blob.
    pub id: BlobId,
    /// Original filename (the final segment of the name it was saved under).
    pub filename: String,
    /// MIME content-type, if one was known at write time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Length of the content in bytes.
    pub length: u64,
    /// When the write completed.
    pub upload_date: Timestamp,
    /// Image width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Image height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Hex-encoded SHA-256 of the content.
    pub sha256: String,
}

impl BlobInfo {
    /// Returns the image dimensions when both are recorded.
    pub fn dimensions(&self) -> Option<Dimensions> {
        match (self.width, self.height) {
            (Some(width), Some(height)) => Some(Dimensions { width, height }),
            _ => None,
        }
    }
}

/// Attributes of a blob that is about to be written.
#[derive(Clone, Debug)]
pub struct NewBlob {
    pub id: BlobId,
    pub filename: String,
    pub content_type: Option<String>,
    pub dimensions: Option<Dimensions>,
}

impl NewBlob {
    /// Creates attributes for a new blob with a freshly generated identifier.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            id: BlobId::generate(),
            filename: filename.into(),
            content_type: None,
            dimensions: None,
        }
    }

    /// Sets the content-type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    /// Sets the image dimensions.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: Option<Dimensions>) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Builds the final metadata document once the content is written.
    pub(crate) fn into_info(self, length: u64, sha256: String) -> BlobInfo {
        BlobInfo {
            id: self.id,
            filename: self.filename,
            content_type: self.content_type,
            length,
            upload_date: Timestamp::now(),
            width: self.dimensions.map(|d| d.width),
            height: self.dimensions.map(|d| d.height),
            sha256,
        }
    }
}

/// A stored blob opened for reading: its metadata plus a chunk stream.
pub struct BlobReader {
    pub info: BlobInfo,
    pub chunks: BoxStream<'static, io::Result<Bytes>>,
}

impl fmt::Debug for BlobReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobReader")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// A collection-scoped backing store for blobs and their metadata documents.
#[async_trait::async_trait]
pub trait BlobBackend: Send + Sync + 'static {
    /// Name of the collection this backend writes into.
    fn collection(&self) -> &str;

    /// Writes `data` in a single call and returns the stored metadata.
    async fn put(&self, data: Bytes, blob: NewBlob) -> Result<BlobInfo>;

    /// Opens a write handle for a chunked write.
    async fn new_file(&self, blob: NewBlob) -> Result<Box<dyn BlobWriter>>;

    /// Looks up the metadata document, `None` if the blob does not exist.
    async fn info(&self, id: &BlobId) -> Result<Option<BlobInfo>>;

    /// Opens the blob for reading, `None` if it does not exist.
    async fn open(&self, id: &BlobId) -> Result<Option<BlobReader>>;

    /// Deletes the blob; fails with [`Error::NotFound`](crate::Error::NotFound) if it is absent.
    async fn delete(&self, id: &BlobId) -> Result<()>;

    /// Lists the metadata of every blob in the collection, in backend order.
    async fn list(&self) -> Result<Vec<BlobInfo>>;
}

/// A scoped write handle returned by [`BlobBackend::new_file`].
///
/// Every handle must end in exactly one of [`close`](Self::close) or
/// [`abort`](Self::abort).
#[async_trait::async_trait]
pub trait BlobWriter: Send {
    /// Identifier the blob will have once closed.
    fn id(&self) -> BlobId;

    /// Appends a chunk.
    async fn write(&mut self, chunk: Bytes) -> Result<()>;

    /// Completes the write and persists the metadata document.
    async fn close(self: Box<Self>) -> Result<BlobInfo>;

    /// Discards everything written so far.
    async fn abort(self: Box<Self>) -> Result<()>;
}
