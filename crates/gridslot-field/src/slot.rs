//! Slot replacement and the record deletion hook.
//!
//! Replacing a slot runs in three steps:
//!
//! 1. write the new blob (uploads only),
//! 2. commit the record with a check-and-set on its revision,
//! 3. delete the blob the *persisted* record referenced before the commit.
//!
//! A failed commit removes the blob written in step 1. Step 3 is best
//! effort: its failure is reported in [`Cleanup`] and never undoes the
//! replacement. A previous blob that is still referenced by the committed
//! record is never deleted.

use gridslot_store::{BlobId, Content};

use crate::{Attachments, Error, FileField, Record, RecordKey, Result, TRACING_TARGET_SLOT};

/// New value for a slot.
#[derive(Debug)]
pub enum SlotInput {
    /// Store new content under `name`.
    Upload { name: String, content: Content },
    /// Point the slot at a blob already held by the field's store.
    Assign(BlobId),
    /// Empty the slot.
    Clear,
}

impl SlotInput {
    pub fn upload(name: impl Into<String>, content: Content) -> Self {
        Self::Upload {
            name: name.into(),
            content,
        }
    }

    /// Returns `true` if applying this input would leave `current` as is.
    fn is_unchanged(&self, current: Option<BlobId>) -> bool {
        match self {
            Self::Upload { .. } => false,
            Self::Assign(id) => current == Some(*id),
            Self::Clear => current.is_none(),
        }
    }
}

/// What happened to a blob that lost its slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cleanup {
    /// There was no blob to remove.
    Nothing,
    /// The blob was deleted.
    Deleted(BlobId),
    /// The blob was already gone.
    Missing(BlobId),
    /// Deleting the blob failed; it may be orphaned.
    Failed { id: BlobId, error: String },
}

impl Cleanup {
    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Result of [`Attachments::replace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The slot already held the requested value. Nothing was written.
    Unchanged,
    /// The record was committed with the new slot value.
    Replaced {
        previous: Option<BlobId>,
        current: Option<BlobId>,
        cleanup: Cleanup,
    },
}

impl ReplaceOutcome {
    /// The slot value after the call, if it changed.
    pub fn current(&self) -> Option<BlobId> {
        match self {
            Self::Unchanged => None,
            Self::Replaced { current, .. } => *current,
        }
    }
}

/// Per-field cleanup results of the deletion hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub entries: Vec<(String, Cleanup)>,
}

impl CleanupReport {
    /// Identifiers that were deleted.
    pub fn deleted(&self) -> impl Iterator<Item = BlobId> + '_ {
        self.entries.iter().filter_map(|(_, cleanup)| match cleanup {
            Cleanup::Deleted(id) => Some(*id),
            _ => None,
        })
    }

    /// Entries whose delete failed.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Cleanup)> {
        self.entries
            .iter()
            .filter(|(_, cleanup)| cleanup.is_failed())
            .map(|(field, cleanup)| (field.as_str(), cleanup))
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl Attachments {
    /// Assigns a new value to `field` of `record` and persists the record.
    ///
    /// `record` must be the copy most recently read or returned by the record
    /// store; a stale copy fails with [`Error::Conflict`] before anything is
    /// written. On success `record` is updated to the committed copy.
    #[tracing::instrument(
        name = "slot.replace",
        skip(self, record, input),
        target = TRACING_TARGET_SLOT,
        fields(record = %record.key())
    )]
    pub async fn replace(
        &self,
        record: &mut Record,
        field: &str,
        input: SlotInput,
    ) -> Result<ReplaceOutcome> {
        let field = self.schema.field(field)?;
        if input.is_unchanged(record.slot(field.name())) {
            tracing::debug!(target: TRACING_TARGET_SLOT, field = field.name(), "Slot unchanged");
            return Ok(ReplaceOutcome::Unchanged);
        }

        let persisted = self.records.get_current(record.key()).await?;
        let persisted_revision = persisted.as_ref().map_or(0, Record::revision);
        if persisted_revision != record.revision() {
            return Err(Error::conflict(
                record.key(),
                record.revision(),
                persisted_revision,
            ));
        }
        let previous = persisted.and_then(|current| current.slot(field.name()));

        let (current, uploaded) = match input {
            SlotInput::Upload { name, content } => {
                let id = field.store().save(&name, field.prepare(content)).await?;
                (Some(id), true)
            }
            SlotInput::Assign(id) => {
                let store = field.store();
                if !store.exists(&id).await? {
                    return Err(gridslot_store::Error::not_found(store.collection(), id).into());
                }
                (Some(id), false)
            }
            SlotInput::Clear => (None, false),
        };

        let mut updated = record.clone();
        updated.set_slot(field.name(), current);
        let committed = match self.records.save(&updated).await {
            Ok(committed) => committed,
            Err(err) => {
                if let (true, Some(id)) = (uploaded, current) {
                    self.rollback(field, id).await;
                }
                return Err(err);
            }
        };
        *record = committed;

        let cleanup = match previous {
            Some(prior) if record.slots().all(|(_, id)| id != prior) => {
                self.discard(field, prior).await
            }
            _ => Cleanup::Nothing,
        };

        tracing::info!(
            target: TRACING_TARGET_SLOT,
            field = field.name(),
            previous = ?previous.map(|id| id.to_string()),
            current = ?current.map(|id| id.to_string()),
            "Slot replaced"
        );

        Ok(ReplaceOutcome::Replaced {
            previous,
            current,
            cleanup,
        })
    }

    /// Deletes the blob of every non-empty slot of a record that was deleted.
    ///
    /// Failures are logged and reported, never raised.
    #[tracing::instrument(
        name = "slot.on_record_deleted",
        skip(self, record),
        target = TRACING_TARGET_SLOT,
        fields(record = %record.key())
    )]
    pub async fn on_record_deleted(&self, record: &Record) -> CleanupReport {
        let mut report = CleanupReport::default();
        for field in self.schema.fields() {
            let Some(id) = record.slot(field.name()) else {
                continue;
            };
            let cleanup = self.discard(field, id).await;
            report.entries.push((field.name().to_owned(), cleanup));
        }
        report
    }

    /// Deletes a persisted record, then runs the deletion hook on it.
    pub async fn delete_record(&self, key: &RecordKey) -> Result<CleanupReport> {
        let record = self
            .records
            .delete(key)
            .await?
            .ok_or_else(|| Error::record_not_found(key))?;
        Ok(self.on_record_deleted(&record).await)
    }

    async fn discard(&self, field: &FileField, id: BlobId) -> Cleanup {
        match field.store().delete(&id).await {
            Ok(()) => {
                tracing::debug!(target: TRACING_TARGET_SLOT, field = field.name(), %id, "Deleted blob");
                Cleanup::Deleted(id)
            }
            Err(err) if err.is_not_found() => {
                tracing::debug!(target: TRACING_TARGET_SLOT, field = field.name(), %id, "Blob already gone");
                Cleanup::Missing(id)
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_SLOT,
                    field = field.name(),
                    %id,
                    error = %err,
                    "Failed to delete blob, it may be orphaned"
                );
                Cleanup::Failed {
                    id,
                    error: err.to_string(),
                }
            }
        }
    }

    async fn rollback(&self, field: &FileField, id: BlobId) {
        if let Err(err) = field.store().delete(&id).await {
            tracing::warn!(
                target: TRACING_TARGET_SLOT,
                field = field.name(),
                %id,
                error = %err,
                "Failed to remove blob of an uncommitted replace"
            );
        }
    }
}
