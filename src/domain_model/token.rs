use super::OwnerId;
use chrono::{DateTime, Utc};
use std::fmt;

/// Opaque token string. Compared byte for byte, never normalized.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct TokenValue(pub String);

impl TokenValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Token values end up in logs through `?record`; keep them out.
impl fmt::Debug for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenValue(..)")
    }
}

impl From<&str> for TokenValue {
    fn from(s: &str) -> Self {
        TokenValue(s.to_string())
    }
}

/// The single persisted record per owner. Writing a new one replaces the old.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TokenRecord {
    pub owner_id: OwnerId,
    pub value: TokenValue,
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
