//! Provider trait and object storage provider factories.

mod local;
mod memory;
mod provider;
#[cfg(feature = "aws")]
mod s3;

pub use local::{LocalCredentials, LocalProvider};
pub use memory::{MemoryCredentials, MemoryProvider};
pub use provider::Provider;
#[cfg(feature = "aws")]
pub(crate) use s3::default_region as default_s3_region;
#[cfg(feature = "aws")]
pub use s3::{S3Credentials, S3Provider};
