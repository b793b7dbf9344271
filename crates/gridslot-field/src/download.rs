//! Download resolution for record-scoped URLs.

use std::fmt;

use gridslot_store::backend::BlobInfo;
use gridslot_store::{BlobHandle, BlobId, BlobStore};

use crate::{Attachments, Error, RecordKey, Result, TRACING_TARGET_RETRIEVAL};

/// How a download should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Render in place (text and image content).
    Inline,
    /// Offer as a file download.
    Attachment,
}

impl Disposition {
    /// Inline for content-types containing `text` or `image`, attachment otherwise.
    pub fn for_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.contains("text") || ct.contains("image") => Self::Inline,
            _ => Self::Attachment,
        }
    }
}

/// A blob ready to be served.
pub struct Download {
    disposition: Disposition,
    handle: BlobHandle,
}

impl Download {
    fn new(handle: BlobHandle) -> Self {
        Self {
            disposition: Disposition::for_content_type(handle.content_type()),
            handle,
        }
    }

    #[inline]
    pub fn info(&self) -> &BlobInfo {
        self.handle.info()
    }

    #[inline]
    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    /// Content-type to serve, if one was recorded.
    pub fn content_type(&self) -> Option<&str> {
        self.handle.content_type()
    }

    /// `Content-Disposition` header value for attachments.
    pub fn content_disposition(&self) -> Option<String> {
        match self.disposition {
            Disposition::Inline => None,
            Disposition::Attachment => {
                Some(format!("attachment; filename={}", self.handle.filename()))
            }
        }
    }

    /// Gives up the metadata and returns the readable body.
    pub fn into_handle(self) -> BlobHandle {
        self.handle
    }
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("disposition", &self.disposition)
            .field("info", self.info())
            .finish()
    }
}

impl Attachments {
    /// Resolves `<kind>/<model>/<record id>/<blob id>` to a servable blob.
    ///
    /// The record must exist. The blob is looked up in the store of every
    /// field of the schema, in declaration order.
    #[tracing::instrument(
        name = "download.resolve",
        skip(self, key),
        target = TRACING_TARGET_RETRIEVAL,
        fields(record = %key)
    )]
    pub async fn download(&self, key: &RecordKey, id: &BlobId) -> Result<Download> {
        if !self.schema.describes(key) {
            return Err(Error::record_not_found(key));
        }
        self.records
            .get_current(key)
            .await?
            .ok_or_else(|| Error::record_not_found(key))?;

        let mut searched: Vec<&BlobStore> = Vec::new();
        for field in self.schema.fields() {
            let store = field.store();
            if searched.iter().any(|seen| store.same_backend(seen)) {
                continue;
            }
            match store.read(id).await {
                Ok(handle) => {
                    tracing::debug!(
                        target: TRACING_TARGET_RETRIEVAL,
                        field = field.name(),
                        %id,
                        "Resolved download"
                    );
                    return Ok(Download::new(handle));
                }
                Err(err) if err.is_not_found() => searched.push(store),
                Err(err) => return Err(err.into()),
            }
        }

        Err(Error::BlobNotFound {
            record: key.to_string(),
            id: id.to_string(),
        })
    }
}
