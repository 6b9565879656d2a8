use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

pub const FAKE_VALID_TOKEN: &str = "fake-unlock-token";
pub const FAKE_FAILING_TOKEN: &str = "000000";

#[derive(Debug)]
pub struct FakeRotationService {
    policy: RotationPolicy,
}

impl FakeRotationService {
    pub fn new(policy: RotationPolicy) -> Self {
        Self { policy }
    }
}

// Fixed answers for front-end work without a store.
// Every owner accepts FAKE_VALID_TOKEN any number of times.
#[async_trait::async_trait]
impl RotationService for FakeRotationService {
    async fn verify_and_rotate(&self, input: VerifyInput) -> VerificationOutcome {
        if input.owner_id.is_none() {
            return VerificationOutcome::Rejected(RejectReason::MissingIdentity);
        }
        match input.presented_token.as_str() {
            "" => VerificationOutcome::Rejected(RejectReason::EmptyToken),
            FAKE_VALID_TOKEN => VerificationOutcome::Rotated,
            FAKE_FAILING_TOKEN => {
                VerificationOutcome::StoreFailure("simulated store failure".to_string())
            }
            _ => VerificationOutcome::Rejected(RejectReason::Mismatch),
        }
    }

    async fn issue(
        &self,
        owner_id: &OwnerId,
        now: DateTime<Utc>,
        window: WindowHours,
    ) -> Result<TokenRecord, RotationError> {
        Ok(TokenRecord {
            owner_id: owner_id.clone(),
            value: TokenValue::from(FAKE_VALID_TOKEN),
            expires_at: window.expires_after(now),
        })
    }

    fn policy(&self) -> RotationPolicy {
        self.policy
    }
}
