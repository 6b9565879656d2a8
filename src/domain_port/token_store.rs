use crate::domain_model::*;

#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Current record for the owner, `None` if nothing was ever issued.
    async fn read(&self, owner_id: &OwnerId) -> Result<Option<TokenRecord>, TokenStoreError>;

    /// Unconditional overwrite; creates the record if absent.
    async fn write(&self, owner_id: &OwnerId, record: &TokenRecord) -> Result<(), TokenStoreError>;

    /// Replace the record only if the stored value still equals `expected`.
    /// Returns `false` without touching anything when it does not (or when absent).
    async fn replace_if(
        &self,
        owner_id: &OwnerId,
        expected: &TokenValue,
        record: &TokenRecord,
    ) -> Result<bool, TokenStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("malformed token record: {0}")]
    Malformed(String),
}
