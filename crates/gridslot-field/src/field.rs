//! File field declarations and record schemas.

use std::fmt;

use gridslot_store::{BlobStore, Content};

use crate::{Error, RecordKey, Result};

/// Whether a slot holds arbitrary files or images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Generic file; dimensions are never stored.
    File,
    /// Image; width and height are stored when the content provides them.
    Image,
}

impl FieldKind {
    #[inline]
    pub fn keeps_dimensions(self) -> bool {
        matches!(self, Self::Image)
    }
}

/// A file slot bound to the blob store holding its blobs.
#[derive(Clone)]
pub struct FileField {
    name: String,
    kind: FieldKind,
    store: BlobStore,
}

impl FileField {
    /// Declares a generic file slot.
    pub fn file(name: impl Into<String>, store: BlobStore) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::File,
            store,
        }
    }

    /// Declares an image slot.
    pub fn image(name: impl Into<String>, store: BlobStore) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Image,
            store,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[inline]
    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Strips attributes this kind of field does not record.
    pub(crate) fn prepare(&self, content: Content) -> Content {
        if self.kind.keeps_dimensions() {
            content
        } else {
            content.without_dimensions()
        }
    }
}

impl fmt::Debug for FileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileField")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("collection", &self.store.collection())
            .finish()
    }
}

/// The file fields of one record type.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    kind: String,
    model: String,
    fields: Vec<FileField>,
}

impl ModelSchema {
    /// Creates a schema with no fields for records of `kind/model`.
    pub fn new(kind: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            model: model.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field, replacing any earlier field with the same name.
    pub fn with_field(mut self, field: FileField) -> Self {
        self.fields.retain(|existing| existing.name != field.name);
        self.fields.push(field);
        self
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn fields(&self) -> &[FileField] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Result<&FileField> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .ok_or_else(|| Error::UnknownField {
                model: self.model.clone(),
                field: name.to_owned(),
            })
    }

    /// Builds the key of a record of this type.
    pub fn key(&self, id: impl Into<String>) -> RecordKey {
        RecordKey::new(self.kind.clone(), self.model.clone(), id)
    }

    /// Returns `true` if `key` names a record of this type.
    pub fn describes(&self, key: &RecordKey) -> bool {
        key.kind() == self.kind && key.model() == self.model
    }
}
