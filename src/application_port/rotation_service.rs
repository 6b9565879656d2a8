use crate::domain_model::*;
use crate::domain_port::TokenStoreError;
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone)]
pub struct VerifyInput {
    /// `None` when the caller has no established identity.
    pub owner_id: Option<OwnerId>,
    pub presented_token: TokenValue,
    pub now: DateTime<Utc>,
    pub window: WindowHours,
}

/// Result of one verification call. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The presented token was consumed and a replacement stored.
    Rotated,
    Rejected(RejectReason),
    StoreFailure(String),
}

/// Why a token was rejected. For operators only, never shown to end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingIdentity,
    EmptyToken,
    NotIssued,
    Mismatch,
    Expired,
    LostRace,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::MissingIdentity => "missing identity",
            RejectReason::EmptyToken => "empty token",
            RejectReason::NotIssued => "no token issued",
            RejectReason::Mismatch => "token mismatch",
            RejectReason::Expired => "token expired",
            RejectReason::LostRace => "concurrent rotation won",
        };
        f.write_str(s)
    }
}

impl VerificationOutcome {
    pub fn is_rotated(&self) -> bool {
        matches!(self, VerificationOutcome::Rotated)
    }
}

impl From<TokenStoreError> for VerificationOutcome {
    fn from(err: TokenStoreError) -> Self {
        VerificationOutcome::StoreFailure(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationPolicy {
    pub window: WindowHours,
    /// Reject records whose `expires_at` has passed.
    pub enforce_expiry: bool,
    /// Use the store's compare-and-swap instead of a blind overwrite.
    pub conditional_write: bool,
}

impl RotationPolicy {
    pub fn new(window: WindowHours) -> Self {
        RotationPolicy {
            window,
            enforce_expiry: false,
            conditional_write: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    #[error("store error: {0}")]
    Store(#[from] TokenStoreError),
}

#[async_trait::async_trait]
pub trait RotationService: Send + Sync {
    /// Check `presented_token` against the owner's stored record and, on a
    /// match, replace it with a fresh one. Storage errors come back as
    /// `StoreFailure`, never as `Err`.
    async fn verify_and_rotate(&self, input: VerifyInput) -> VerificationOutcome;

    /// Mint and store a token for `owner_id`, replacing any previous one.
    async fn issue(
        &self,
        owner_id: &OwnerId,
        now: DateTime<Utc>,
        window: WindowHours,
    ) -> Result<TokenRecord, RotationError>;

    fn policy(&self) -> RotationPolicy;
}
