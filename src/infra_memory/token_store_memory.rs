use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

/// Process-local store. Each owner's entry is locked for the duration of
/// `replace_if`, so compare and write happen as one step.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    records: DashMap<OwnerId, TokenRecord>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn read(&self, owner_id: &OwnerId) -> Result<Option<TokenRecord>, TokenStoreError> {
        Ok(self.records.get(owner_id).map(|entry| (*entry).clone()))
    }

    async fn write(&self, owner_id: &OwnerId, record: &TokenRecord) -> Result<(), TokenStoreError> {
        self.records.insert(owner_id.clone(), record.clone());
        Ok(())
    }

    async fn replace_if(
        &self,
        owner_id: &OwnerId,
        expected: &TokenValue,
        record: &TokenRecord,
    ) -> Result<bool, TokenStoreError> {
        let Some(mut entry) = self.records.get_mut(owner_id) else {
            return Ok(false);
        };
        let current: &mut TokenRecord = &mut *entry;
        if current.value != *expected {
            return Ok(false);
        }
        *current = record.clone();
        Ok(true)
    }
}
