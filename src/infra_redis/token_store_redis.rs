use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::collections::HashMap;

const TOKEN_SWAP: &str = include_str!("token_swap.lua");

const FIELD_VALUE: &str = "value";
const FIELD_EXPIRES_AT: &str = "expires_at";

/// One hash per owner: `{prefix}:{owner_id}` -> { value, expires_at }.
pub struct RedisTokenStore {
    conn: ConnectionManager,
    prefix: String,
    swap: Script,
}

impl RedisTokenStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisTokenStore {
            conn,
            prefix: prefix.into(),
            swap: Script::new(TOKEN_SWAP),
        }
    }

    fn key(&self, owner_id: &OwnerId) -> String {
        format!("{}:{}", self.prefix, owner_id)
    }

    fn parse_record(
        owner_id: &OwnerId,
        mut fields: HashMap<String, String>,
    ) -> Result<TokenRecord, TokenStoreError> {
        let value = fields
            .remove(FIELD_VALUE)
            .ok_or_else(|| TokenStoreError::Malformed(format!("{owner_id}: missing value")))?;
        let millis = fields
            .get(FIELD_EXPIRES_AT)
            .ok_or_else(|| TokenStoreError::Malformed(format!("{owner_id}: missing expires_at")))?
            .parse::<i64>()
            .map_err(|e| TokenStoreError::Malformed(format!("{owner_id}: expires_at: {e}")))?;
        let expires_at = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            TokenStoreError::Malformed(format!("{owner_id}: expires_at out of range"))
        })?;

        Ok(TokenRecord {
            owner_id: owner_id.clone(),
            value: TokenValue(value),
            expires_at,
        })
    }
}

#[async_trait::async_trait]
impl TokenStore for RedisTokenStore {
    async fn read(&self, owner_id: &OwnerId) -> Result<Option<TokenRecord>, TokenStoreError> {
        let key = self.key(owner_id);
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn
            .hgetall(&key)
            .await
            .map_err(|e| TokenStoreError::Unavailable(e.to_string()))?;
        if fields.is_empty() {
            return Ok(None);
        }
        Self::parse_record(owner_id, fields).map(Some)
    }

    async fn write(&self, owner_id: &OwnerId, record: &TokenRecord) -> Result<(), TokenStoreError> {
        let key = self.key(owner_id);
        let mut conn = self.conn.clone();
        let fields = [
            (FIELD_VALUE, record.value.as_str().to_string()),
            (FIELD_EXPIRES_AT, record.expires_at.timestamp_millis().to_string()),
        ];
        // DEL first so no stray field from an older shape survives the overwrite
        let _: () = redis::pipe()
            .atomic()
            .del(&key)
            .ignore()
            .hset_multiple(&key, &fields)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| TokenStoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn replace_if(
        &self,
        owner_id: &OwnerId,
        expected: &TokenValue,
        record: &TokenRecord,
    ) -> Result<bool, TokenStoreError> {
        let key = self.key(owner_id);
        let mut conn = self.conn.clone();
        let swapped: i64 = self
            .swap
            .key(&key)
            .arg(expected.as_str())
            .arg(record.value.as_str())
            .arg(record.expires_at.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| TokenStoreError::Unavailable(e.to_string()))?;
        Ok(swapped == 1)
    }
}
