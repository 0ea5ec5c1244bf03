use std::collections::HashMap;

use parking_lot::RwLock;
use reconcile_core::{CoreResult, SubscriptionRecord, SubscriptionStore, TenantId};

/// Subscription records held in process memory.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    records: RwLock<HashMap<TenantId, SubscriptionRecord>>,
}

impl InMemorySubscriptionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = SubscriptionRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.tenant_id, record))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl SubscriptionStore for InMemorySubscriptionStore {
    fn get(&self, tenant_id: TenantId) -> CoreResult<Option<SubscriptionRecord>> {
        Ok(self.records.read().get(&tenant_id).cloned())
    }

    fn put(&self, record: &SubscriptionRecord) -> CoreResult<()> {
        self.records
            .write()
            .insert(record.tenant_id, record.clone());
        Ok(())
    }
}
