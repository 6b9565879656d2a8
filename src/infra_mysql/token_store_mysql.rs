use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

const SCHEMA: &str = include_str!("../../sql/access_token.sql");

/// Backed by the `access_token` table, see `sql/access_token.sql`.
pub struct MySqlTokenStore {
    pool: MySqlPool,
}

impl MySqlTokenStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlTokenStore { pool }
    }

    /// Creates `access_token` if it is missing. An existing table is left as is.
    pub async fn ensure_schema(&self) -> Result<(), TokenStoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| TokenStoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    fn row_to_record(owner_id: &OwnerId, row: MySqlRow) -> Result<TokenRecord, TokenStoreError> {
        let value: Option<Vec<u8>> = row
            .try_get("token_value")
            .map_err(|e| TokenStoreError::Malformed(format!("token_value: {e}")))?;
        let value = value
            .ok_or_else(|| TokenStoreError::Malformed(format!("{owner_id}: null token_value")))?;
        let value = String::from_utf8(value)
            .map_err(|e| TokenStoreError::Malformed(format!("{owner_id}: token_value: {e}")))?;

        let expires_at: Option<DateTime<Utc>> = row
            .try_get("expires_at")
            .map_err(|e| TokenStoreError::Malformed(format!("expires_at: {e}")))?;
        let expires_at = expires_at
            .ok_or_else(|| TokenStoreError::Malformed(format!("{owner_id}: null expires_at")))?;

        Ok(TokenRecord {
            owner_id: owner_id.clone(),
            value: TokenValue(value),
            expires_at,
        })
    }
}

#[async_trait::async_trait]
impl TokenStore for MySqlTokenStore {
    async fn read(&self, owner_id: &OwnerId) -> Result<Option<TokenRecord>, TokenStoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT token_value, expires_at
FROM access_token
WHERE owner_id = ?
"#,
        )
        .bind(owner_id.as_str().as_bytes())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TokenStoreError::Unavailable(e.to_string()))?;

        row_opt
            .map(|row| Self::row_to_record(owner_id, row))
            .transpose()
    }

    async fn write(&self, owner_id: &OwnerId, record: &TokenRecord) -> Result<(), TokenStoreError> {
        sqlx::query(
            r#"
INSERT INTO access_token (owner_id, token_value, expires_at)
VALUES (?, ?, ?)
ON DUPLICATE KEY UPDATE token_value = VALUES(token_value), expires_at = VALUES(expires_at)
"#,
        )
        .bind(owner_id.as_str().as_bytes())
        .bind(record.value.as_str().as_bytes())
        .bind(record.expires_at)
        .execute(&self.pool)
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
        let res = sqlx::query(
            r#"
UPDATE access_token SET token_value = ?, expires_at = ?
WHERE owner_id = ? AND token_value = ?
"#,
        )
        .bind(record.value.as_str().as_bytes())
        .bind(record.expires_at)
        .bind(owner_id.as_str().as_bytes())
        .bind(expected.as_str().as_bytes())
        .execute(&self.pool)
        .await
        .map_err(|e| TokenStoreError::Unavailable(e.to_string()))?;

        Ok(res.rows_affected() == 1)
    }
}
