use std::sync::Arc;

use gridslot_store::RetryConfig;

use crate::{ModelSchema, RecordStore};

/// Slot operations for the records described by one schema.
///
/// Cheap to clone. The retry policy applies to the display helpers only;
/// it defaults to [`RetryConfig::lookup`].
#[derive(Clone)]
pub struct Attachments {
    pub(crate) schema: Arc<ModelSchema>,
    pub(crate) records: Arc<dyn RecordStore>,
    pub(crate) retry: RetryConfig,
}

impl Attachments {
    /// Binds a schema to the store persisting its records.
    pub fn new(schema: ModelSchema, records: Arc<dyn RecordStore>) -> Self {
        Self {
            schema: Arc::new(schema),
            records,
            retry: RetryConfig::lookup(),
        }
    }

    /// Overrides the lookup retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[inline]
    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    #[inline]
    pub fn records(&self) -> &dyn RecordStore {
        self.records.as_ref()
    }
}
