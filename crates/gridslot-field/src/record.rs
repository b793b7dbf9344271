//! Owning records and their persistence.
//!
//! A [`Record`] carries one optional blob identifier per file slot and a
//! revision counter. [`RecordStore::save`] is a check-and-set on that
//! revision, which is what keeps two concurrent replacements of the same
//! slot from both believing they own the prior blob.

use std::collections::{BTreeMap, HashMap};

use derive_more::Display;
use gridslot_store::{BlobId, OwnerRef};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{Error, Result, TRACING_TARGET_RECORD};

/// Identifies a record: owner kind, owner type and the record's own id.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[display("{kind}/{model}/{id}")]
pub struct RecordKey {
    kind: String,
    model: String,
    id: String,
}

impl RecordKey {
    /// Creates a record key.
    pub fn new(kind: impl Into<String>, model: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            model: model.into(),
            id: id.into(),
        }
    }

    /// Parses `kind/model/id`.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.splitn(3, '/');
        let kind = parts.next()?;
        let model = parts.next()?;
        let id = parts.next()?;
        if kind.is_empty() || model.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(kind, model, id))
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the owner context used for record-scoped URLs.
    pub fn owner(&self) -> OwnerRef<'_> {
        OwnerRef::new(&self.kind, &self.model, &self.id)
    }
}

/// An owning record with its file slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    key: RecordKey,
    revision: u64,
    #[serde(default)]
    slots: BTreeMap<String, BlobId>,
}

impl Record {
    /// Creates a record that has never been persisted.
    pub fn new(key: RecordKey) -> Self {
        Self {
            key,
            revision: 0,
            slots: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// Revision this copy was read at. Zero for a record never saved.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the blob held by `field`, if any.
    pub fn slot(&self, field: &str) -> Option<BlobId> {
        self.slots.get(field).copied()
    }

    /// Sets or clears a slot in memory. Nothing is persisted.
    pub fn set_slot(&mut self, field: impl Into<String>, value: Option<BlobId>) {
        let field = field.into();
        match value {
            Some(id) => {
                self.slots.insert(field, id);
            }
            None => {
                self.slots.remove(&field);
            }
        }
    }

    /// Iterates over the non-empty slots.
    pub fn slots(&self) -> impl Iterator<Item = (&str, BlobId)> {
        self.slots.iter().map(|(field, id)| (field.as_str(), *id))
    }
}

/// Persistence for owning records.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Loads the currently persisted version of a record.
    async fn get_current(&self, key: &RecordKey) -> Result<Option<Record>>;

    /// Persists `record` if the stored revision still equals `record.revision()`.
    ///
    /// A record that was never saved has revision zero. On success the stored
    /// copy, with its revision bumped, is returned. Otherwise
    /// [`Error::Conflict`] is returned and nothing changes.
    async fn save(&self, record: &Record) -> Result<Record>;

    /// Removes a record, returning the copy that was stored.
    async fn delete(&self, key: &RecordKey) -> Result<Option<Record>>;
}

/// In-process [`RecordStore`].
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<RecordKey, Record>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_current(&self, key: &RecordKey) -> Result<Option<Record>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn save(&self, record: &Record) -> Result<Record> {
        let mut records = self.records.write().await;
        let actual = records.get(&record.key).map_or(0, Record::revision);
        if actual != record.revision {
            tracing::debug!(
                target: TRACING_TARGET_RECORD,
                record = %record.key,
                expected = record.revision,
                actual,
                "Rejected stale record save"
            );
            return Err(Error::conflict(&record.key, record.revision, actual));
        }

        let mut stored = record.clone();
        stored.revision += 1;
        records.insert(stored.key.clone(), stored.clone());

        tracing::debug!(
            target: TRACING_TARGET_RECORD,
            record = %stored.key,
            revision = stored.revision,
            "Record saved"
        );
        Ok(stored)
    }

    async fn delete(&self, key: &RecordKey) -> Result<Option<Record>> {
        Ok(self.records.write().await.remove(key))
    }
}
