//! Provider trait for creating object store clients.

use serde::de::DeserializeOwned;

use crate::Result;
use crate::backend::ObjectStoreClient;

/// Factory for creating connected object store clients.
///
/// Implementations handle credential validation, connectivity verification,
/// and client construction for a specific provider (e.g. S3, local disk).
#[async_trait::async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Strongly-typed credentials for this provider.
    type Credentials: DeserializeOwned + Send + Sync;

    /// Unique identifier (e.g. "s3", "local").
    const ID: &str;

    /// Create a connected client instance.
    async fn connect(creds: &Self::Credentials) -> Result<ObjectStoreClient>;

    /// Verify credentials by connecting and probing the store.
    async fn verify(creds: &Self::Credentials) -> Result<()> {
        Self::connect(creds).await?.verify_reachable().await
    }
}
