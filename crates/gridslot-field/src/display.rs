//! Display helpers for slots whose blob may not be visible yet.
//!
//! Right after a write, a replica-backed store can briefly report the new blob
//! as missing. Both helpers retry the metadata lookup on "not found" only,
//! following the configured [`RetryConfig`](gridslot_store::RetryConfig).

use gridslot_store::backend::BlobInfo;
use gridslot_store::BlobId;

use crate::{Attachments, Error, FileField, Record, Result, TRACING_TARGET_RETRIEVAL};

impl Attachments {
    /// Returns the record-scoped URL of the blob in `field`.
    ///
    /// Fails with [`Error::EmptySlot`] when the slot is empty, or with the
    /// store's not-found error once every attempt has missed.
    pub async fn display_url(&self, record: &Record, field: &str) -> Result<String> {
        let field = self.schema.field(field)?;
        let id = record
            .slot(field.name())
            .ok_or_else(|| Error::empty_slot(record.key(), field.name()))?;

        self.lookup(field, id).await?;
        Ok(field.store().url(&id, Some(record.key().owner())))
    }

    /// Returns the filename of the blob in `field` for display.
    ///
    /// An empty slot, or a blob still missing after every attempt, renders as
    /// an empty label.
    pub async fn display_label(&self, record: &Record, field: &str) -> Result<String> {
        let field = self.schema.field(field)?;
        let Some(id) = record.slot(field.name()) else {
            return Ok(String::new());
        };

        match self.lookup(field, id).await {
            Ok(info) => Ok(info.filename),
            Err(err) if err.is_not_found() => {
                tracing::warn!(
                    target: TRACING_TARGET_RETRIEVAL,
                    record = %record.key(),
                    field = field.name(),
                    %id,
                    "Blob still missing after retries, rendering empty label"
                );
                Ok(String::new())
            }
            Err(err) => Err(err),
        }
    }

    async fn lookup(&self, field: &FileField, id: BlobId) -> Result<BlobInfo> {
        let store = field.store();
        self.retry
            .retry_if(
                move || async move { store.info(&id).await.map_err(Error::from) },
                Error::is_not_found,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use bytes::Bytes;
    use gridslot_store::backend::{BlobBackend, BlobReader, BlobWriter, NewBlob, ObjectStoreBackend};
    use gridslot_store::{BlobStore, Content, RetryConfig};

    use super::*;
    use crate::testing::{self, fixture};
    use crate::{FileField, MemoryRecordStore, ModelSchema, SlotInput};

    /// Hides every blob from the first `misses` metadata lookups.
    struct LaggingBackend {
        inner: ObjectStoreBackend,
        misses: AtomicU32,
        lookups: Arc<AtomicU32>,
    }

    #[async_trait::async_trait]
    impl BlobBackend for LaggingBackend {
        fn collection(&self) -> &str {
            self.inner.collection()
        }

        async fn put(&self, data: Bytes, blob: NewBlob) -> gridslot_store::Result<BlobInfo> {
            self.inner.put(data, blob).await
        }

        async fn new_file(&self, blob: NewBlob) -> gridslot_store::Result<Box<dyn BlobWriter>> {
            self.inner.new_file(blob).await
        }

        async fn info(&self, id: &BlobId) -> gridslot_store::Result<Option<BlobInfo>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            let hidden = self
                .misses
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if hidden {
                return Ok(None);
            }
            self.inner.info(id).await
        }

        async fn open(&self, id: &BlobId) -> gridslot_store::Result<Option<BlobReader>> {
            self.inner.open(id).await
        }

        async fn delete(&self, id: &BlobId) -> gridslot_store::Result<()> {
            self.inner.delete(id).await
        }

        async fn list(&self) -> gridslot_store::Result<Vec<BlobInfo>> {
            self.inner.list().await
        }
    }

    async fn lagging(misses: u32) -> (Attachments, Arc<AtomicU32>) {
        let lookups = Arc::new(AtomicU32::new(0));
        let backend = LaggingBackend {
            inner: ObjectStoreBackend::new(testing::client().await, "files"),
            misses: AtomicU32::new(misses),
            lookups: lookups.clone(),
        };
        let store = BlobStore::new(backend, testing::BASE_URL);
        let schema = ModelSchema::new("app", "document").with_field(FileField::file("file", store));
        let attachments = Attachments::new(schema, Arc::new(MemoryRecordStore::new()))
            .with_retry(RetryConfig::fixed(3, Duration::ZERO));
        (attachments, lookups)
    }

    async fn uploaded(attachments: &Attachments) -> Record {
        let mut record = Record::new(attachments.schema().key("1"));
        attachments
            .replace(
                &mut record,
                "file",
                SlotInput::upload("report.pdf", Content::from_bytes("pdf")),
            )
            .await
            .unwrap();
        record
    }

    #[tokio::test]
    async fn url_is_record_scoped() {
        let fx = fixture().await;
        let mut record = fx.record("7").await;
        let id = fx
            .attachments
            .replace(&mut record, "file", SlotInput::upload("a.txt", Content::from_bytes("x")))
            .await
            .unwrap()
            .current()
            .unwrap();

        let url = fx.attachments.display_url(&record, "file").await.unwrap();
        assert_eq!(url, format!("/files/app/document/7/{id}/"));
        assert_eq!(fx.attachments.display_label(&record, "file").await.unwrap(), "a.txt");
    }

    #[tokio::test]
    async fn lookup_retries_until_visible() {
        let (attachments, lookups) = lagging(2).await;
        let record = uploaded(&attachments).await;

        let label = attachments.display_label(&record, "file").await.unwrap();
        assert_eq!(label, "report.pdf");
        assert_eq!(lookups.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn label_is_empty_when_retries_run_out() {
        let (attachments, lookups) = lagging(u32::MAX).await;
        let record = uploaded(&attachments).await;

        let label = attachments.display_label(&record, "file").await.unwrap();
        assert_eq!(label, "");
        assert_eq!(lookups.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn url_fails_when_retries_run_out() {
        let (attachments, lookups) = lagging(u32::MAX).await;
        let record = uploaded(&attachments).await;

        let err = attachments.display_url(&record, "file").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(lookups.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn empty_slot() {
        let fx = fixture().await;
        let record = fx.record("1").await;

        let err = fx.attachments.display_url(&record, "file").await.unwrap_err();
        assert!(matches!(err, Error::EmptySlot { .. }));
        assert_eq!(fx.attachments.display_label(&record, "file").await.unwrap(), "");
    }
}
