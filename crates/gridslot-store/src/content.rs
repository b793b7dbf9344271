//! Content payload handed to the store, with optional content-type and image dimensions.

use std::fmt;
use std::io;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Width and height of image content, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// The bytes of a [`Content`], either fully buffered or produced chunk by chunk.
pub enum ContentBody {
    /// The whole payload is already in memory.
    Buffered(Bytes),
    /// A chunk-producing sequence; consumed once by a streaming write.
    Chunked(BoxStream<'static, io::Result<Bytes>>),
}

/// Content to be saved into a [`BlobStore`](crate::BlobStore).
///
/// Whether the body is chunked decides how the store writes it: chunked
/// bodies go through a write handle, buffered ones through a single put.
pub struct Content {
    body: ContentBody,
    content_type: Option<String>,
    dimensions: Option<Dimensions>,
}

impl Content {
    /// Create buffered content from raw bytes.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::new(ContentBody::Buffered(data.into()))
    }

    /// Create chunked content from a stream of byte chunks.
    pub fn from_stream<S>(chunks: S) -> Self
    where
        S: futures::Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self::new(ContentBody::Chunked(chunks.boxed()))
    }

    /// Create chunked content from an async reader.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self::from_stream(ReaderStream::new(reader))
    }

    /// Create chunked content from already split chunks.
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        I::IntoIter: Send + 'static,
        B: Into<Bytes>,
    {
        Self::from_stream(stream::iter(chunks.into_iter().map(|c| Ok(c.into()))))
    }

    fn new(body: ContentBody) -> Self {
        Self {
            body,
            content_type: None,
            dimensions: None,
        }
    }

    /// Attach a content-type (MIME) to this content.
    #[must_use]
    pub fn with_content_type(mut self, ct: impl Into<String>) -> Self {
        self.content_type = Some(ct.into());
        self
    }

    /// Attach image dimensions to this content.
    #[must_use]
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some(Dimensions { width, height });
        self
    }

    /// Drop any attached dimensions.
    #[must_use]
    pub fn without_dimensions(mut self) -> Self {
        self.dimensions = None;
        self
    }

    /// Return the content-type, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Return the image dimensions, if both were given.
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    /// Returns `true` when the body is a chunk stream.
    pub fn is_chunked(&self) -> bool {
        matches!(self.body, ContentBody::Chunked(_))
    }

    /// Split into the body and its descriptive parts.
    pub(crate) fn into_parts(self) -> (ContentBody, Option<String>, Option<Dimensions>) {
        (self.body, self.content_type, self.dimensions)
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match &self.body {
            ContentBody::Buffered(data) => format!("Buffered({} bytes)", data.len()),
            ContentBody::Chunked(_) => "Chunked".to_string(),
        };
        f.debug_struct("Content")
            .field("body", &body)
            .field("content_type", &self.content_type)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_buffered() {
        let content = Content::from_bytes("hello").with_content_type("text/plain");
        assert!(!content.is_chunked());
        assert_eq!(content.content_type(), Some("text/plain"));
        assert_eq!(content.dimensions(), None);
    }

    #[test]
    fn readers_are_chunked() {
        let content = Content::from_reader(&b"hello"[..]);
        assert!(content.is_chunked());
    }

    #[test]
    fn dimensions_can_be_dropped() {
        let content = Content::from_bytes("png").with_dimensions(640, 480);
        assert_eq!(
            content.dimensions(),
            Some(Dimensions {
                width: 640,
                height: 480
            })
        );
        assert_eq!(content.without_dimensions().dimensions(), None);
    }

    #[tokio::test]
    async fn chunks_come_out_in_order() {
        let content = Content::from_chunks(vec!["ab", "cd"]);
        let (body, _, _) = content.into_parts();
        let ContentBody::Chunked(stream) = body else {
            panic!("expected chunked body");
        };
        let chunks: Vec<_> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks, vec![Bytes::from("ab"), Bytes::from("cd")]);
    }
}
