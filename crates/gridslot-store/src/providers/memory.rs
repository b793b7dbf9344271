//! In-process provider using [`object_store::memory::InMemory`].

use object_store::memory::InMemory;
use serde::{Deserialize, Serialize};

use super::Provider;
use crate::backend::ObjectStoreClient;
use crate::{Result, TRACING_TARGET_PROVIDER};

/// The memory provider takes no credentials.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct MemoryCredentials {}

/// Volatile storage, dropped with the last client clone.
pub struct MemoryProvider;

#[async_trait::async_trait]
impl Provider for MemoryProvider {
    type Credentials = MemoryCredentials;

    const ID: &str = "memory";

    async fn connect(_creds: &Self::Credentials) -> Result<ObjectStoreClient> {
        tracing::debug!(target: TRACING_TARGET_PROVIDER, provider = Self::ID, "Created in-memory store");
        Ok(ObjectStoreClient::new(InMemory::new()))
    }
}
