//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::time::Duration;

use gridslot_store::backend::{ObjectStoreBackend, ObjectStoreClient};
use gridslot_store::providers::{MemoryCredentials, MemoryProvider, Provider};
use gridslot_store::{BlobStore, RetryConfig};

use crate::{Attachments, FileField, MemoryRecordStore, ModelSchema, Record};

pub(crate) const BASE_URL: &str = "/files/";

pub(crate) async fn client() -> ObjectStoreClient {
    MemoryProvider::connect(&MemoryCredentials::default())
        .await
        .unwrap()
}

pub(crate) async fn store(collection: &str) -> BlobStore {
    BlobStore::new(ObjectStoreBackend::new(client().await, collection), BASE_URL)
}

pub(crate) struct Fixture {
    pub attachments: Attachments,
    pub records: Arc<MemoryRecordStore>,
    pub files: BlobStore,
    pub pictures: BlobStore,
}

impl Fixture {
    /// Persists a fresh record with the given id.
    pub async fn record(&self, id: &str) -> Record {
        use crate::RecordStore;

        let key = self.attachments.schema().key(id);
        self.records.save(&Record::new(key)).await.unwrap()
    }
}

/// Schema `app/document` with a `file` field and a `picture` image field,
/// each in its own collection of one shared in-memory object store.
pub(crate) async fn fixture() -> Fixture {
    let client = client().await;
    let files = BlobStore::new(ObjectStoreBackend::new(client.clone(), "files"), BASE_URL);
    let pictures = BlobStore::new(ObjectStoreBackend::new(client, "pictures"), BASE_URL);

    let schema = ModelSchema::new("app", "document")
        .with_field(FileField::file("file", files.clone()))
        .with_field(FileField::image("picture", pictures.clone()));

    let records = Arc::new(MemoryRecordStore::new());
    let attachments = Attachments::new(schema, records.clone())
        .with_retry(RetryConfig::fixed(3, Duration::ZERO));

    Fixture {
        attachments,
        records,
        files,
        pictures,
    }
}
