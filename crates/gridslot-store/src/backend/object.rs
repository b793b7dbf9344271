//! [`BlobBackend`] over an [`object_store::ObjectStore`].
//!
//! Each blob occupies two objects under its collection:
//!
//! ```text
//! <collection>/<id>/data       content bytes
//! <collection>/<id>/meta.json  BlobInfo document
//! ```
//!
//! The metadata document is written after the bytes and removed before them,
//! so a blob exists exactly when its document does.

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::WriteMultipart;

use super::{BlobBackend, BlobInfo, BlobReader, BlobWriter, Digest, NewBlob, ObjectStoreClient};
use crate::{BlobId, Error, Result, TRACING_TARGET_OBJECT};

const DATA_OBJECT: &str = "data";
const META_OBJECT: &str = "meta.json";

/// Maximum number of multipart parts in flight per write handle.
const MAX_CONCURRENT_PARTS: usize = 4;

/// A collection of blobs stored in an object store.
#[derive(Clone, Debug)]
pub struct ObjectStoreBackend {
    client: ObjectStoreClient,
    collection: String,
}

impl ObjectStoreBackend {
    /// Creates a backend writing into `collection` of the given client.
    pub fn new(client: ObjectStoreClient, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }

    /// Returns the underlying object store client.
    #[inline]
    pub fn client(&self) -> &ObjectStoreClient {
        &self.client
    }

    fn data_key(&self, id: &BlobId) -> String {
        format!("{}/{id}/{DATA_OBJECT}", self.collection)
    }

    fn meta_key(&self, id: &BlobId) -> String {
        format!("{}/{id}/{META_OBJECT}", self.collection)
    }

    async fn write_info(&self, info: &BlobInfo) -> Result<()> {
        let document = serde_json::to_vec(info)?;
        self.client
            .put(&self.meta_key(&info.id), Bytes::from(document))
            .await?;
        Ok(())
    }

    async fn read_info(&self, key: &str) -> Result<Option<BlobInfo>> {
        let Some(document) = self.client.get(key).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&document)?))
    }
}

#[async_trait::async_trait]
impl BlobBackend for ObjectStoreBackend {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn put(&self, data: Bytes, blob: NewBlob) -> Result<BlobInfo> {
        let (length, sha256) = Digest::of(&data).finalize();
        let key = self.data_key(&blob.id);
        self.client.put(&key, data).await?;

        let info = blob.into_info(length, sha256);
        if let Err(err) = self.write_info(&info).await {
            // Without its document the content object is unreachable.
            self.client.delete(&key).await.ok();
            return Err(err);
        }

        tracing::debug!(
            target: TRACING_TARGET_OBJECT,
            collection = %self.collection,
            id = %info.id,
            size = length,
            "Stored blob in a single put"
        );

        Ok(info)
    }

    async fn new_file(&self, blob: NewBlob) -> Result<Box<dyn BlobWriter>> {
        let upload = self.client.put_multipart(&self.data_key(&blob.id)).await?;

        tracing::debug!(
            target: TRACING_TARGET_OBJECT,
            collection = %self.collection,
            id = %blob.id,
            filename = %blob.filename,
            "Opened write handle"
        );

        Ok(Box::new(ObjectBlobWriter {
            backend: self.clone(),
            blob,
            upload,
            digest: Digest::default(),
        }))
    }

    async fn info(&self, id: &BlobId) -> Result<Option<BlobInfo>> {
        self.read_info(&self.meta_key(id)).await
    }

    async fn open(&self, id: &BlobId) -> Result<Option<BlobReader>> {
        let Some(info) = self.info(id).await? else {
            return Ok(None);
        };

        let Some(stream) = self.client.get_stream(&self.data_key(id)).await? else {
            tracing::warn!(
                target: TRACING_TARGET_OBJECT,
                collection = %self.collection,
                id = %id,
                "Metadata document has no content object"
            );
            return Ok(None);
        };

        let chunks = stream.map_err(std::io::Error::other);
        Ok(Some(BlobReader {
            info,
            chunks: Box::pin(chunks),
        }))
    }

    async fn delete(&self, id: &BlobId) -> Result<()> {
        let meta_key = self.meta_key(id);
        if self.client.head(&meta_key).await?.is_none() {
            return Err(Error::not_found(&self.collection, id));
        }

        self.client.delete(&meta_key).await?;
        self.client.delete(&self.data_key(id)).await?;

        tracing::debug!(
            target: TRACING_TARGET_OBJECT,
            collection = %self.collection,
            id = %id,
            "Deleted blob"
        );

        Ok(())
    }

    async fn list(&self) -> Result<Vec<BlobInfo>> {
        let objects = self.client.list(&self.collection).await?;

        let mut infos = Vec::new();
        for meta in objects {
            if meta.location.filename() != Some(META_OBJECT) {
                continue;
            }
            if let Some(info) = self.read_info(meta.location.as_ref()).await? {
                infos.push(info);
            }
        }

        Ok(infos)
    }
}

/// Multipart write handle for [`ObjectStoreBackend`].
struct ObjectBlobWriter {
    backend: ObjectStoreBackend,
    blob: NewBlob,
    upload: WriteMultipart,
    digest: Digest,
}

#[async_trait::async_trait]
impl BlobWriter for ObjectBlobWriter {
    fn id(&self) -> BlobId {
        self.blob.id
    }

    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        self.upload
            .wait_for_capacity(MAX_CONCURRENT_PARTS)
            .await
            .map_err(|e| Error::from_object_store("put_part", e))?;
        self.digest.update(&chunk);
        self.upload.write(&chunk);
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<BlobInfo> {
        let Self {
            backend,
            blob,
            upload,
            digest,
        } = *self;

        upload
            .finish()
            .await
            .map_err(|e| Error::from_object_store("complete_multipart", e))?;

        let (length, sha256) = digest.finalize();
        let info = blob.into_info(length, sha256);
        if let Err(err) = backend.write_info(&info).await {
            // Without its document the content object is unreachable.
            backend.client.delete(&backend.data_key(&info.id)).await.ok();
            return Err(err);
        }

        tracing::debug!(
            target: TRACING_TARGET_OBJECT,
            collection = %backend.collection,
            id = %info.id,
            size = length,
            "Closed write handle"
        );

        Ok(info)
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        let Self {
            backend,
            blob,
            upload,
            ..
        } = *self;

        upload
            .abort()
            .await
            .map_err(|e| Error::from_object_store("abort_multipart", e))?;

        tracing::debug!(
            target: TRACING_TARGET_OBJECT,
            collection = %backend.collection,
            id = %blob.id,
            "Aborted write handle"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use object_store::local::LocalFileSystem;
    use object_store::memory::InMemory;

    use super::*;

    fn test_backend() -> ObjectStoreBackend {
        ObjectStoreBackend::new(ObjectStoreClient::new(InMemory::new()), "fs")
    }

    async fn read_all(reader: BlobReader) -> Vec<u8> {
        let chunks: Vec<_> = reader.chunks.collect().await;
        chunks
            .into_iter()
            .flat_map(|c| c.unwrap().to_vec())
            .collect()
    }

    #[tokio::test]
    async fn put_writes_document_and_content() {
        let backend = test_backend();
        let blob = NewBlob::new("a.txt").with_content_type(Some("text/plain".into()));
        let id = blob.id;

        let info = backend.put(Bytes::from("hello"), blob).await.unwrap();
        assert_eq!(info.id, id);
        assert_eq!(info.length, 5);

        let stored = backend.info(&id).await.unwrap().unwrap();
        assert_eq!(stored, info);

        let reader = backend.open(&id).await.unwrap().unwrap();
        assert_eq!(read_all(reader).await, b"hello");
    }

    #[tokio::test]
    async fn failed_document_write_removes_content() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalFileSystem::new_with_prefix(dir.path()).unwrap();
        let backend = ObjectStoreBackend::new(ObjectStoreClient::new(local), "fs");
        let blob = NewBlob::new("a.txt");
        let id = blob.id;
        // A directory in place of the document makes its write fail.
        std::fs::create_dir_all(dir.path().join("fs").join(id.to_string()).join(META_OBJECT))
            .unwrap();

        assert!(backend.put(Bytes::from("hello"), blob).await.is_err());

        let content = backend.client().head(&backend.data_key(&id)).await.unwrap();
        assert!(content.is_none());
    }

    #[tokio::test]
    async fn writer_close_persists_blob() {
        let backend = test_backend();
        let mut writer = backend.new_file(NewBlob::new("big.bin")).await.unwrap();
        let id = writer.id();
        writer.write(Bytes::from("abc")).await.unwrap();
        writer.write(Bytes::from("def")).await.unwrap();

        let info = writer.close().await.unwrap();
        assert_eq!(info.length, 6);
        assert_eq!(info.sha256, Digest::of(b"abcdef").finalize().1);

        let reader = backend.open(&id).await.unwrap().unwrap();
        assert_eq!(read_all(reader).await, b"abcdef");
    }

    #[tokio::test]
    async fn writer_abort_leaves_nothing() {
        let backend = test_backend();
        let mut writer = backend.new_file(NewBlob::new("gone.bin")).await.unwrap();
        let id = writer.id();
        writer.write(Bytes::from("partial")).await.unwrap();
        writer.abort().await.unwrap();

        assert!(backend.info(&id).await.unwrap().is_none());
        assert!(backend.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let backend = test_backend();
        let err = backend.delete(&BlobId::generate()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_document_and_content() {
        let backend = test_backend();
        let info = backend
            .put(Bytes::from("x"), NewBlob::new("x.bin"))
            .await
            .unwrap();

        backend.delete(&info.id).await.unwrap();
        assert!(backend.info(&info.id).await.unwrap().is_none());
        assert!(backend.client().head(&backend.data_key(&info.id)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_scoped_to_collection() {
        let client = ObjectStoreClient::new(InMemory::new());
        let files = ObjectStoreBackend::new(client.clone(), "files");
        let pics = ObjectStoreBackend::new(client, "pics");

        files.put(Bytes::from("1"), NewBlob::new("one.txt")).await.unwrap();
        files.put(Bytes::from("2"), NewBlob::new("two.txt")).await.unwrap();
        pics.put(Bytes::from("3"), NewBlob::new("three.png")).await.unwrap();

        let mut names: Vec<_> = files
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|info| info.filename)
            .collect();
        names.sort();
        assert_eq!(names, vec!["one.txt", "two.txt"]);
        assert_eq!(pics.list().await.unwrap().len(), 1);
    }
}
