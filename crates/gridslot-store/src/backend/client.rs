//! Cloneable object-store client backed by [`object_store::ObjectStore`].
//!
//! [`ObjectStoreClient`] is a thin wrapper around `Arc<dyn ObjectStore>` that
//! provides convenience methods for the operations the blob backend needs.
//! Lookups map a not-found response to `None`; every other failure becomes a
//! crate [`Error`](crate::Error).

use std::sync::Arc;

use bytes::Bytes;
use derive_more::Deref;
use futures::TryStreamExt;
use futures::stream::BoxStream;
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore, PutPayload, PutResult, WriteMultipart};

use crate::{Error, Result, TRACING_TARGET_OBJECT};

/// Cloneable handle to any [`ObjectStore`] backend (S3, local disk, memory, ...).
///
/// All methods accept string keys and convert them to
/// [`object_store::path::Path`] internally. Derefs to the wrapped store for
/// operations not covered here.
#[derive(Clone, Debug, Deref)]
pub struct ObjectStoreClient(Arc<dyn ObjectStore>);

impl ObjectStoreClient {
    /// Wrap a concrete [`ObjectStore`] implementation.
    pub fn new(store: impl ObjectStore) -> Self {
        Self(Arc::new(store))
    }

    /// Wrap an already shared [`ObjectStore`].
    pub fn from_arc(store: Arc<dyn ObjectStore>) -> Self {
        Self(store)
    }

    /// Verify that the backing store is reachable.
    ///
    /// Issues a HEAD for a sentinel key; a not-found response is treated as
    /// success, any other error is propagated.
    #[tracing::instrument(name = "object.verify", skip(self), target = TRACING_TARGET_OBJECT)]
    pub async fn verify_reachable(&self) -> Result<()> {
        self.head("_gridslot_verify").await.map(|_| ())
    }

    /// List object metadata under `prefix`.
    #[tracing::instrument(name = "object.list", skip(self), target = TRACING_TARGET_OBJECT)]
    pub async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let prefix = (!prefix.is_empty()).then(|| Path::from(prefix));
        self.0
            .list(prefix.as_ref())
            .try_collect()
            .await
            .map_err(|e| Error::from_object_store("list", e))
    }

    /// Retrieve the raw bytes stored at `key`.
    #[tracing::instrument(name = "object.get", skip(self), target = TRACING_TARGET_OBJECT)]
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let result = match self.0.get(&Path::from(key)).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(Error::from_object_store("get", e)),
        };

        let data = result
            .bytes()
            .await
            .map_err(|e| Error::from_object_store("get", e))?;
        Ok(Some(data))
    }

    /// Open the object at `key` as a chunk stream.
    #[tracing::instrument(name = "object.get_stream", skip(self), target = TRACING_TARGET_OBJECT)]
    pub async fn get_stream(
        &self,
        key: &str,
    ) -> Result<Option<BoxStream<'static, object_store::Result<Bytes>>>> {
        match self.0.get(&Path::from(key)).await {
            Ok(result) => Ok(Some(result.into_stream())),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(Error::from_object_store("get_stream", e)),
        }
    }

    /// Upload `data` to `key`, overwriting any existing object.
    #[tracing::instrument(name = "object.put", skip(self, data), fields(size = data.len()), target = TRACING_TARGET_OBJECT)]
    pub async fn put(&self, key: &str, data: Bytes) -> Result<PutResult> {
        self.0
            .put(&Path::from(key), PutPayload::from(data))
            .await
            .map_err(|e| Error::from_object_store("put", e))
    }

    /// Start a multipart upload to `key`.
    #[tracing::instrument(name = "object.put_multipart", skip(self), target = TRACING_TARGET_OBJECT)]
    pub async fn put_multipart(&self, key: &str) -> Result<WriteMultipart> {
        let upload = self
            .0
            .put_multipart(&Path::from(key))
            .await
            .map_err(|e| Error::from_object_store("put_multipart", e))?;
        Ok(WriteMultipart::new(upload))
    }

    /// Get object metadata without downloading the body.
    #[tracing::instrument(name = "object.head", skip(self), target = TRACING_TARGET_OBJECT)]
    pub async fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
        match self.0.head(&Path::from(key)).await {
            Ok(meta) => Ok(Some(meta)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(Error::from_object_store("head", e)),
        }
    }

    /// Delete the object at `key`. Deleting a missing key is not an error.
    #[tracing::instrument(name = "object.delete", skip(self), target = TRACING_TARGET_OBJECT)]
    pub async fn delete(&self, key: &str) -> Result<()> {
        match self.0.delete(&Path::from(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(Error::from_object_store("delete", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use object_store::memory::InMemory;

    use super::*;

    fn test_client() -> ObjectStoreClient {
        ObjectStoreClient::new(InMemory::new())
    }

    #[tokio::test]
    async fn put_and_get() {
        let client = test_client();
        let data = Bytes::from("hello world");
        client.put("test.txt", data.clone()).await.unwrap();

        let result = client.get("test.txt").await.unwrap();
        assert_eq!(result, Some(data));
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let client = test_client();
        assert_eq!(client.get("missing").await.unwrap(), None);
        assert!(client.get_stream("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn head() {
        let client = test_client();
        client.put("head.bin", Bytes::from("data")).await.unwrap();

        let meta = client.head("head.bin").await.unwrap().unwrap();
        assert_eq!(meta.size, 4);
        assert_eq!(meta.location, Path::from("head.bin"));
        assert!(client.head("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_tolerant_of_missing_keys() {
        let client = test_client();
        client.put("del.bin", Bytes::from("x")).await.unwrap();
        client.delete("del.bin").await.unwrap();
        client.delete("del.bin").await.unwrap();

        assert!(client.get("del.bin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list() {
        let client = test_client();
        for i in 0..3 {
            client
                .put(&format!("dir/file{i}.txt"), Bytes::from(format!("{i}")))
                .await
                .unwrap();
        }
        client.put("other/file.txt", Bytes::from("x")).await.unwrap();

        let items = client.list("dir").await.unwrap();
        assert_eq!(items.len(), 3);
    }

    #[tokio::test]
    async fn multipart_upload() {
        let client = test_client();
        let mut upload = client.put_multipart("multi.bin").await.unwrap();
        upload.write(b"hello ");
        upload.write(b"world");
        upload.finish().await.unwrap();

        let mut stream = client.get_stream("multi.bin").await.unwrap().unwrap();
        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(data, b"hello world");
    }

    #[tokio::test]
    async fn verify_reachable() {
        let client = test_client();
        client.verify_reachable().await.unwrap();
    }
}
