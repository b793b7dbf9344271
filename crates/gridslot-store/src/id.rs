//! Opaque blob identifier backed by UUIDv7.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Length of the hex rendering of a [`BlobId`].
const HEX_LEN: usize = 32;

/// A fixed-width (16 byte) blob identifier, rendered as 32 lowercase hex characters.
///
/// Identifiers are generated by the store at write time. UUIDv7 keeps them
/// time-ordered, so a listing of raw keys roughly follows upload order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobId(Uuid);

impl BlobId {
    /// Generates a fresh time-ordered identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the raw 16 bytes of the identifier.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.simple(), f)
    }
}

impl FromStr for BlobId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::invalid_id(
                s,
                format!("expected {HEX_LEN} hex characters"),
            ));
        }

        Uuid::try_parse(s)
            .map(Self)
            .map_err(|e| Error::invalid_id(s, e.to_string()))
    }
}

impl TryFrom<String> for BlobId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BlobId> for String {
    fn from(id: BlobId) -> Self {
        id.to_string()
    }
}
