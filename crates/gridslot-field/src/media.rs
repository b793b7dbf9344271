//! Local media cache.
//!
//! Blobs are copied to `<root>/<owner kind>/<collection>/<filename>`. The
//! first writer wins: an existing file is never overwritten, even when the
//! slot now holds a different blob with the same filename.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::{Attachments, Error, Record, Result, TRACING_TARGET_RETRIEVAL};

impl Attachments {
    /// Copies the blob in `field` into the media directory under `root`
    /// and returns the path of the cached file.
    #[tracing::instrument(
        name = "media.materialize",
        skip(self, record, root),
        target = TRACING_TARGET_RETRIEVAL,
        fields(record = %record.key())
    )]
    pub async fn materialize(&self, record: &Record, field: &str, root: &Path) -> Result<PathBuf> {
        let field = self.schema.field(field)?;
        let id = record
            .slot(field.name())
            .ok_or_else(|| Error::empty_slot(record.key(), field.name()))?;

        let handle = field.store().read(&id).await?;
        let dir = root
            .join(path_component(record.key().kind())?)
            .join(path_component(field.store().collection())?);
        let path = dir.join(path_component(handle.filename())?);

        fs::create_dir_all(&dir).await?;
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(
                    target: TRACING_TARGET_RETRIEVAL,
                    path = %path.display(),
                    "Media file already present"
                );
                return Ok(path);
            }
            Err(err) => return Err(err.into()),
        };

        let mut reader = handle.into_reader();
        let copied = async {
            let written = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            Ok::<_, io::Error>(written)
        }
        .await;

        match copied {
            Ok(written) => {
                tracing::debug!(
                    target: TRACING_TARGET_RETRIEVAL,
                    path = %path.display(),
                    size = written,
                    "Materialized blob"
                );
                Ok(path)
            }
            Err(err) => {
                drop(file);
                if let Err(remove_err) = fs::remove_file(&path).await {
                    tracing::warn!(
                        target: TRACING_TARGET_RETRIEVAL,
                        path = %path.display(),
                        error = %remove_err,
                        "Failed to remove partial media file"
                    );
                }
                Err(err.into())
            }
        }
    }
}

/// Accepts a single normal path segment.
fn path_component(value: &str) -> Result<&str> {
    let unsafe_component = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '\0']);
    if unsafe_component {
        return Err(Error::UnsafePath {
            component: value.to_owned(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use gridslot_store::Content;

    use super::*;
    use crate::SlotInput;
    use crate::testing::fixture;

    #[test]
    fn rejects_escaping_components() {
        for value in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(
                path_component(value),
                Err(Error::UnsafePath { .. })
            ));
        }
        assert_eq!(path_component("report.pdf").unwrap(), "report.pdf");
    }

    #[tokio::test]
    async fn writes_once_and_keeps_first_copy() {
        let fx = fixture().await;
        let dir = tempfile::tempdir().unwrap();
        let mut record = fx.record("1").await;

        fx.attachments
            .replace(&mut record, "file", SlotInput::upload("a.txt", Content::from_bytes("one")))
            .await
            .unwrap();
        let path = fx
            .attachments
            .materialize(&record, "file", dir.path())
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("app").join("files").join("a.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"one");

        fx.attachments
            .replace(&mut record, "file", SlotInput::upload("a.txt", Content::from_bytes("two")))
            .await
            .unwrap();
        let again = fx
            .attachments
            .materialize(&record, "file", dir.path())
            .await
            .unwrap();
        assert_eq!(again, path);
        assert_eq!(std::fs::read(&path).unwrap(), b"one");
    }

    #[tokio::test]
    async fn streamed_blob_is_copied() {
        let fx = fixture().await;
        let dir = tempfile::tempdir().unwrap();
        let mut record = fx.record("1").await;
        let content = Content::from_chunks(vec!["ab", "cd"]).with_dimensions(1, 1);

        fx.attachments
            .replace(&mut record, "picture", SlotInput::upload("p.png", content))
            .await
            .unwrap();
        let path = fx
            .attachments
            .materialize(&record, "picture", dir.path())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("app").join("pictures").join("p.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"abcd");
    }

    #[tokio::test]
    async fn missing_blob_creates_nothing() {
        let fx = fixture().await;
        let dir = tempfile::tempdir().unwrap();
        let mut record = fx.record("1").await;
        record.set_slot("file", Some(gridslot_store::BlobId::generate()));

        let err = fx
            .attachments
            .materialize(&record, "file", dir.path())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(!dir.path().join("app").exists());
    }
}
