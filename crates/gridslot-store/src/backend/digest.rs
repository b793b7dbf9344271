//! Running SHA-256 and length over written chunks.

use sha2::Sha256;

/// Accumulates the digest and byte count of content as it is written.
#[derive(Clone, Default)]
pub(crate) struct Digest {
    hasher: Sha256,
    length: u64,
}

impl Digest {
    /// Feeds a chunk into the digest.
    pub fn update(&mut self, chunk: &[u8]) {
        sha2::Digest::update(&mut self.hasher, chunk);
        self.length += chunk.len() as u64;
    }

    /// Digest of a single buffered payload.
    pub fn of(data: &[u8]) -> Self {
        let mut digest = Self::default();
        digest.update(data);
        digest
    }

    /// Consumes the digest and returns the byte count and hex-encoded hash.
    pub fn finalize(self) -> (u64, String) {
        let hash = sha2::Digest::finalize(self.hasher);
        (self.length, hex::encode(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_digest() {
        let (length, hash) = Digest::default().finalize();
        assert_eq!(length, 0);
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn chunked_matches_single_payload() {
        let mut chunked = Digest::default();
        chunked.update(b"Hello, ");
        chunked.update(b"World!");

        let (length, hash) = chunked.finalize();
        assert_eq!(length, 13);
        assert_eq!(
            hash,
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
        assert_eq!(Digest::of(b"Hello, World!").finalize().1, hash);
    }
}
