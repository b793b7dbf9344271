//! The blob store facade: save, read, locate, list and delete blobs by identifier.

use std::fmt;
use std::io;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::BoxStream;
use jiff::Timestamp;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

use crate::backend::{BlobBackend, BlobInfo, BlobReader, BlobWriter, NewBlob};
use crate::{BlobId, Content, ContentBody, Error, Result, TRACING_TARGET_STORE};

/// Owner context used to build retrieval URLs.
///
/// Mirrors the `<owner_kind>/<owner_type>/<owner_id>` prefix of record-scoped
/// URLs. A component that is empty counts as missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnerRef<'a> {
    pub kind: &'a str,
    pub owner_type: &'a str,
    pub owner_id: &'a str,
}

impl<'a> OwnerRef<'a> {
    /// Creates owner context from its three components.
    pub fn new(kind: &'a str, owner_type: &'a str, owner_id: &'a str) -> Self {
        Self {
            kind,
            owner_type,
            owner_id,
        }
    }

    /// Returns `true` when every component is present.
    pub fn is_complete(&self) -> bool {
        !self.kind.is_empty() && !self.owner_type.is_empty() && !self.owner_id.is_empty()
    }
}

/// A blob opened for reading.
pub struct BlobHandle {
    info: BlobInfo,
    chunks: BoxStream<'static, io::Result<Bytes>>,
}

impl BlobHandle {
    /// Returns the blob metadata.
    #[inline]
    pub fn info(&self) -> &BlobInfo {
        &self.info
    }

    /// Returns the original filename.
    #[inline]
    pub fn filename(&self) -> &str {
        &self.info.filename
    }

    /// Returns the content-type, if one was recorded.
    #[inline]
    pub fn content_type(&self) -> Option<&str> {
        self.info.content_type.as_deref()
    }

    /// Returns the content length in bytes.
    #[inline]
    pub fn length(&self) -> u64 {
        self.info.length
    }

    /// Consumes the handle and returns the chunk stream.
    pub fn into_chunks(self) -> BoxStream<'static, io::Result<Bytes>> {
        self.chunks
    }

    /// Consumes the handle and returns an async reader over the content.
    pub fn into_reader(self) -> impl AsyncRead + Send + Unpin + 'static {
        StreamReader::new(self.chunks)
    }

    /// Reads the whole content into memory.
    pub async fn read_to_bytes(self) -> Result<Bytes> {
        let capacity = usize::try_from(self.info.length).unwrap_or_default();
        let mut buffer = BytesMut::with_capacity(capacity);
        let mut chunks = self.chunks;
        while let Some(chunk) = chunks.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }
}

impl From<BlobReader> for BlobHandle {
    fn from(reader: BlobReader) -> Self {
        Self {
            info: reader.info,
            chunks: reader.chunks,
        }
    }
}

impl fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobHandle")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Stores binary content in one collection of a backing store, addressed by [`BlobId`].
///
/// The backend is injected at construction; the store holds no lazily
/// initialized connection state. Cloning is cheap and shares the backend.
#[derive(Clone)]
pub struct BlobStore {
    backend: Arc<dyn BlobBackend>,
    base_url: Arc<str>,
}

impl BlobStore {
    /// Creates a store over `backend`, building retrieval URLs on `base_url`.
    pub fn new(backend: impl BlobBackend, base_url: impl AsRef<str>) -> Self {
        Self::from_arc(Arc::new(backend), base_url)
    }

    /// Creates a store over an already shared backend.
    pub fn from_arc(backend: Arc<dyn BlobBackend>, base_url: impl AsRef<str>) -> Self {
        Self {
            backend,
            base_url: Arc::from(base_url.as_ref()),
        }
    }

    /// Returns the collection this store writes into.
    #[inline]
    pub fn collection(&self) -> &str {
        self.backend.collection()
    }

    /// Returns the base URL for retrieval URLs.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns `true` if both stores share the same backend instance.
    pub fn same_backend(&self, other: &BlobStore) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
    }

    /// Saves `content` under the final path segment of `name` and returns the new identifier.
    ///
    /// Chunked content is written through a write handle ([`stream`](Self::stream)),
    /// buffered content in a single put. The name is used as-is: no renaming and
    /// no deduplication.
    pub async fn save(&self, name: &str, content: Content) -> Result<BlobId> {
        let filename = filename_of(name)?;
        let (body, content_type, dimensions) = content.into_parts();
        let blob = NewBlob::new(filename)
            .with_content_type(content_type)
            .with_dimensions(dimensions);

        match body {
            ContentBody::Chunked(chunks) => self.stream(blob, chunks).await,
            ContentBody::Buffered(data) => {
                let info = self.backend.put(data, blob).await?;

                tracing::debug!(
                    target: TRACING_TARGET_STORE,
                    collection = %self.collection(),
                    id = %info.id,
                    filename = %info.filename,
                    size = info.length,
                    "Saved buffered blob"
                );

                Ok(info.id)
            }
        }
    }

    /// Copies `chunks` into a new write handle and returns the new identifier.
    ///
    /// The handle is closed on success and aborted on every failure path. A
    /// failure anywhere in the copy is logged and returned as
    /// [`Error::WriteFailure`]; no identifier is produced.
    pub async fn stream(
        &self,
        blob: NewBlob,
        mut chunks: BoxStream<'static, io::Result<Bytes>>,
    ) -> Result<BlobId> {
        let filename = blob.filename.clone();
        let mut writer = self.backend.new_file(blob).await.map_err(|e| {
            self.log_write_failure(&filename, &e);
            Error::write_failure(&filename, &e)
        })?;

        if let Err(err) = copy_chunks(writer.as_mut(), &mut chunks).await {
            let id = writer.id();
            if let Err(abort_err) = writer.abort().await {
                tracing::warn!(
                    target: TRACING_TARGET_STORE,
                    collection = %self.collection(),
                    id = %id,
                    error = %abort_err,
                    "Failed to abort write handle"
                );
            }
            self.log_write_failure(&filename, &err);
            return Err(Error::write_failure(filename, err));
        }

        let info = writer.close().await.map_err(|e| {
            self.log_write_failure(&filename, &e);
            Error::write_failure(&filename, &e)
        })?;

        tracing::debug!(
            target: TRACING_TARGET_STORE,
            collection = %self.collection(),
            id = %info.id,
            filename = %info.filename,
            size = info.length,
            "Saved streamed blob"
        );

        Ok(info.id)
    }

    fn log_write_failure(&self, filename: &str, err: &Error) {
        tracing::error!(
            target: TRACING_TARGET_STORE,
            collection = %self.collection(),
            filename = %filename,
            error = %err,
            "Can't write blob using storage"
        );
    }

    /// Returns `true` if a blob with this identifier exists.
    pub async fn exists(&self, id: &BlobId) -> Result<bool> {
        Ok(self.backend.info(id).await?.is_some())
    }

    /// Opens the blob for reading.
    pub async fn read(&self, id: &BlobId) -> Result<BlobHandle> {
        self.backend
            .open(id)
            .await?
            .map(BlobHandle::from)
            .ok_or_else(|| Error::not_found(self.collection(), id))
    }

    /// Deletes the blob; fails with [`Error::NotFound`] if it does not exist.
    pub async fn delete(&self, id: &BlobId) -> Result<()> {
        self.backend.delete(id).await?;

        tracing::debug!(
            target: TRACING_TARGET_STORE,
            collection = %self.collection(),
            id = %id,
            "Deleted blob"
        );

        Ok(())
    }

    /// Returns the metadata document of the blob.
    pub async fn info(&self, id: &BlobId) -> Result<BlobInfo> {
        self.backend
            .info(id)
            .await?
            .ok_or_else(|| Error::not_found(self.collection(), id))
    }

    /// Returns the content length in bytes.
    pub async fn size(&self, id: &BlobId) -> Result<u64> {
        Ok(self.info(id).await?.length)
    }

    /// Returns the original filename.
    pub async fn filename(&self, id: &BlobId) -> Result<String> {
        Ok(self.info(id).await?.filename)
    }

    /// Returns when the blob was written.
    pub async fn created_time(&self, id: &BlobId) -> Result<Timestamp> {
        Ok(self.info(id).await?.upload_date)
    }

    /// Lists every stored filename in the collection, in backend order.
    pub async fn listdir(&self) -> Result<Vec<String>> {
        let infos = self.backend.list().await?;
        Ok(infos.into_iter().map(|info| info.filename).collect())
    }

    /// Builds the retrieval URL for `id`.
    ///
    /// With complete owner context the URL is
    /// `<base>/<kind>/<type>/<owner_id>/<id>/`, otherwise `<base>/<id>`.
    /// Pure formatting: no I/O, never fails.
    pub fn url(&self, id: &BlobId, owner: Option<OwnerRef<'_>>) -> String {
        let path = match owner.filter(OwnerRef::is_complete) {
            Some(owner) => format!(
                "{}/{}/{}/{id}/",
                owner.kind, owner.owner_type, owner.owner_id
            ),
            None => id.to_string(),
        };
        join_url(&self.base_url, &path)
    }
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStore")
            .field("collection", &self.collection())
            .field("base_url", &self.base_url)
            .finish()
    }
}

async fn copy_chunks(
    writer: &mut dyn BlobWriter,
    chunks: &mut BoxStream<'static, io::Result<Bytes>>,
) -> Result<()> {
    while let Some(chunk) = chunks.next().await {
        writer.write(chunk?).await?;
    }
    Ok(())
}

/// Final `/`-separated segment of `name`.
fn filename_of(name: &str) -> Result<&str> {
    match name.rsplit('/').next() {
        Some(filename) if !filename.is_empty() => Ok(filename),
        _ => Err(Error::invalid_name(name)),
    }
}

fn join_url(base: &str, path: &str) -> String {
    if base.is_empty() || base.ends_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
