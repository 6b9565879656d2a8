use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::TokenStore;
use crate::logger::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Read, compare, then swap in a fresh token. Nothing is cached between
/// calls; every verification starts from what the store holds now.
pub struct RealRotationService {
    store: Arc<dyn TokenStore>,
    codec: Arc<dyn TokenCodec>,
    policy: RotationPolicy,
}

impl RealRotationService {
    pub fn new(
        store: Arc<dyn TokenStore>,
        codec: Arc<dyn TokenCodec>,
        policy: RotationPolicy,
    ) -> Self {
        Self {
            store,
            codec,
            policy,
        }
    }

    fn mint(&self, owner_id: &OwnerId, now: DateTime<Utc>, window: WindowHours) -> TokenRecord {
        TokenRecord {
            owner_id: owner_id.clone(),
            value: self.codec.generate(),
            expires_at: self.codec.expiry_from(now, window),
        }
    }
}

#[async_trait::async_trait]
impl RotationService for RealRotationService {
    async fn verify_and_rotate(&self, input: VerifyInput) -> VerificationOutcome {
        let VerifyInput {
            owner_id,
            presented_token,
            now,
            window,
        } = input;

        let Some(owner_id) = owner_id else {
            return VerificationOutcome::Rejected(RejectReason::MissingIdentity);
        };
        if presented_token.is_empty() {
            return VerificationOutcome::Rejected(RejectReason::EmptyToken);
        }

        let record = match self.store.read(&owner_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return VerificationOutcome::Rejected(RejectReason::NotIssued),
            Err(e) => {
                warn!(%owner_id, "token read failed: {}", e);
                return e.into();
            }
        };

        if record.value != presented_token {
            return VerificationOutcome::Rejected(RejectReason::Mismatch);
        }
        if self.policy.enforce_expiry && record.is_expired_at(now) {
            debug!(%owner_id, expires_at = %record.expires_at, "presented token expired");
            return VerificationOutcome::Rejected(RejectReason::Expired);
        }

        let replacement = self.mint(&owner_id, now, window);

        let written = if self.policy.conditional_write {
            self.store
                .replace_if(&owner_id, &presented_token, &replacement)
                .await
        } else {
            self.store.write(&owner_id, &replacement).await.map(|_| true)
        };

        match written {
            Ok(true) => {
                debug!(%owner_id, expires_at = %replacement.expires_at, "token rotated");
                VerificationOutcome::Rotated
            }
            Ok(false) => VerificationOutcome::Rejected(RejectReason::LostRace),
            Err(e) => {
                warn!(%owner_id, "token write failed: {}", e);
                e.into()
            }
        }
    }

    async fn issue(
        &self,
        owner_id: &OwnerId,
        now: DateTime<Utc>,
        window: WindowHours,
    ) -> Result<TokenRecord, RotationError> {
        let record = self.mint(owner_id, now, window);
        self.store.write(owner_id, &record).await?;
        info!(%owner_id, expires_at = %record.expires_at, "token issued");
        Ok(record)
    }

    fn policy(&self) -> RotationPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_port::TokenStoreError;
    use crate::infra_memory::MemoryTokenStore;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Hands out `tok-1`, `tok-2`, ... so tests can predict stored values.
    #[derive(Default)]
    struct SequenceCodec {
        next: AtomicUsize,
    }

    impl TokenCodec for SequenceCodec {
        fn generate(&self) -> TokenValue {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            TokenValue(format!("tok-{}", n))
        }
    }

    /// Wraps the memory store with failure switches and call counters.
    #[derive(Default)]
    struct ScriptedStore {
        inner: MemoryTokenStore,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
        malformed: AtomicBool,
        stale_read: Mutex<Option<TokenRecord>>,
        reads: AtomicUsize,
        writes: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TokenStore for ScriptedStore {
        async fn read(&self, owner_id: &OwnerId) -> Result<Option<TokenRecord>, TokenStoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(TokenStoreError::Unavailable("connection refused".into()));
            }
            if self.malformed.load(Ordering::SeqCst) {
                return Err(TokenStoreError::Malformed("missing expires_at".into()));
            }
            if let Some(stale) = self.stale_read.lock().unwrap().clone() {
                return Ok(Some(stale));
            }
            self.inner.read(owner_id).await
        }

        async fn write(
            &self,
            owner_id: &OwnerId,
            record: &TokenRecord,
        ) -> Result<(), TokenStoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(TokenStoreError::Unavailable("write timed out".into()));
            }
            self.inner.write(owner_id, record).await
        }

        async fn replace_if(
            &self,
            owner_id: &OwnerId,
            expected: &TokenValue,
            record: &TokenRecord,
        ) -> Result<bool, TokenStoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(TokenStoreError::Unavailable("write timed out".into()));
            }
            self.inner.replace_if(owner_id, expected, record).await
        }
    }

    fn owner(id: &str) -> OwnerId {
        id.parse().unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
    }

    fn ten_hours() -> WindowHours {
        WindowHours::new(10.0).unwrap()
    }

    fn input(owner_id: &str, token: &str, now: DateTime<Utc>) -> VerifyInput {
        VerifyInput {
            owner_id: Some(owner(owner_id)),
            presented_token: TokenValue::from(token),
            now,
            window: ten_hours(),
        }
    }

    fn stored(owner_id: &str, value: &str, expires_at: DateTime<Utc>) -> TokenRecord {
        TokenRecord {
            owner_id: owner(owner_id),
            value: TokenValue::from(value),
            expires_at,
        }
    }

    fn service_with(store: Arc<ScriptedStore>, policy: RotationPolicy) -> RealRotationService {
        RealRotationService::new(store, Arc::new(SequenceCodec::default()), policy)
    }

    async fn seeded(record: TokenRecord) -> Arc<ScriptedStore> {
        let store = Arc::new(ScriptedStore::default());
        store.inner.write(&record.owner_id, &record).await.unwrap();
        store
    }

    #[tokio::test]
    async fn rotates_once_then_rejects_replay() {
        let store = seeded(stored("u1", "abc", t0())).await;
        let service = service_with(store.clone(), RotationPolicy::new(ten_hours()));
        let t1 = t0() + Duration::hours(1);

        let outcome = service.verify_and_rotate(input("u1", "abc", t1)).await;
        assert_eq!(outcome, VerificationOutcome::Rotated);

        let after = store.inner.read(&owner("u1")).await.unwrap().unwrap();
        assert_ne!(after.value, TokenValue::from("abc"));
        assert_eq!(after.expires_at, t1 + Duration::hours(10));

        let t2 = t1 + Duration::seconds(5);
        let replay = service.verify_and_rotate(input("u1", "abc", t2)).await;
        assert_eq!(replay, VerificationOutcome::Rejected(RejectReason::Mismatch));
        assert_eq!(store.inner.read(&owner("u1")).await.unwrap(), Some(after));
    }

    #[tokio::test]
    async fn rotated_value_is_accepted_next() {
        let store = seeded(stored("u1", "abc", t0())).await;
        let service = service_with(store.clone(), RotationPolicy::new(ten_hours()));

        assert!(service.verify_and_rotate(input("u1", "abc", t0())).await.is_rotated());
        assert!(service.verify_and_rotate(input("u1", "tok-1", t0())).await.is_rotated());
        assert_eq!(
            store.inner.read(&owner("u1")).await.unwrap().unwrap().value,
            TokenValue::from("tok-2")
        );
    }

    #[tokio::test]
    async fn unknown_owner_is_rejected_without_write() {
        let store = Arc::new(ScriptedStore::default());
        let service = service_with(store.clone(), RotationPolicy::new(ten_hours()));

        let outcome = service.verify_and_rotate(input("u2", "anything", t0())).await;

        assert_eq!(outcome, VerificationOutcome::Rejected(RejectReason::NotIssued));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert_eq!(store.inner.read(&owner("u2")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn mismatch_leaves_record_untouched() {
        let original = stored("u1", "abc", t0());
        let store = seeded(original.clone()).await;
        let service = service_with(store.clone(), RotationPolicy::new(ten_hours()));

        for wrong in ["abd", "ABC", " abc", "abc ", "ab"] {
            let outcome = service.verify_and_rotate(input("u1", wrong, t0())).await;
            assert_eq!(outcome, VerificationOutcome::Rejected(RejectReason::Mismatch));
        }
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert_eq!(store.inner.read(&owner("u1")).await.unwrap(), Some(original));
    }

    #[tokio::test]
    async fn missing_identity_or_token_never_touches_store() {
        let store = seeded(stored("u1", "abc", t0())).await;
        let service = service_with(store.clone(), RotationPolicy::new(ten_hours()));

        let mut anonymous = input("u1", "abc", t0());
        anonymous.owner_id = None;
        assert_eq!(
            service.verify_and_rotate(anonymous).await,
            VerificationOutcome::Rejected(RejectReason::MissingIdentity)
        );
        assert_eq!(
            service.verify_and_rotate(input("u1", "", t0())).await,
            VerificationOutcome::Rejected(RejectReason::EmptyToken)
        );
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn read_failure_is_store_failure_without_write() {
        let store = Arc::new(ScriptedStore::default());
        store.fail_reads.store(true, Ordering::SeqCst);
        let service = service_with(store.clone(), RotationPolicy::new(ten_hours()));

        let outcome = service.verify_and_rotate(input("u3", "abc", t0())).await;

        assert!(matches!(outcome, VerificationOutcome::StoreFailure(_)));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_record_is_store_failure() {
        let store = seeded(stored("u1", "abc", t0())).await;
        store.malformed.store(true, Ordering::SeqCst);
        let service = service_with(store.clone(), RotationPolicy::new(ten_hours()));

        let outcome = service.verify_and_rotate(input("u1", "abc", t0())).await;

        assert!(matches!(outcome, VerificationOutcome::StoreFailure(_)));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_write_keeps_old_token_retryable() {
        for conditional_write in [true, false] {
            let original = stored("u1", "abc", t0());
            let store = seeded(original.clone()).await;
            let policy = RotationPolicy {
                conditional_write,
                ..RotationPolicy::new(ten_hours())
            };
            let service = service_with(store.clone(), policy);

            store.fail_writes.store(true, Ordering::SeqCst);
            let outcome = service.verify_and_rotate(input("u1", "abc", t0())).await;
            assert!(matches!(outcome, VerificationOutcome::StoreFailure(_)));
            assert_eq!(store.inner.read(&owner("u1")).await.unwrap(), Some(original));

            store.fail_writes.store(false, Ordering::SeqCst);
            let retry = service.verify_and_rotate(input("u1", "abc", t0())).await;
            assert_eq!(retry, VerificationOutcome::Rotated);
        }
    }

    #[tokio::test]
    async fn expired_token_accepted_unless_enforced() {
        let expired_at = t0();
        let later = t0() + Duration::hours(48);

        let store = seeded(stored("u1", "abc", expired_at)).await;
        let lenient = service_with(store, RotationPolicy::new(ten_hours()));
        assert!(lenient.verify_and_rotate(input("u1", "abc", later)).await.is_rotated());

        let store = seeded(stored("u1", "abc", expired_at)).await;
        let strict = service_with(
            store.clone(),
            RotationPolicy {
                enforce_expiry: true,
                ..RotationPolicy::new(ten_hours())
            },
        );
        assert_eq!(
            strict.verify_and_rotate(input("u1", "abc", later)).await,
            VerificationOutcome::Rejected(RejectReason::Expired)
        );
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        // exactly at expiry is still valid
        assert!(strict.verify_and_rotate(input("u1", "abc", expired_at)).await.is_rotated());
    }

    #[tokio::test]
    async fn stale_match_loses_under_conditional_write() {
        // The read sees "abc" but another request already rotated it to "other".
        let store = seeded(stored("u1", "other", t0())).await;
        *store.stale_read.lock().unwrap() = Some(stored("u1", "abc", t0()));
        let service = service_with(store.clone(), RotationPolicy::new(ten_hours()));

        let outcome = service.verify_and_rotate(input("u1", "abc", t0())).await;

        assert_eq!(outcome, VerificationOutcome::Rejected(RejectReason::LostRace));
        assert_eq!(
            store.inner.read(&owner("u1")).await.unwrap().unwrap().value,
            TokenValue::from("other")
        );
    }

    #[tokio::test]
    async fn stale_match_overwrites_under_blind_write() {
        let store = seeded(stored("u1", "other", t0())).await;
        *store.stale_read.lock().unwrap() = Some(stored("u1", "abc", t0()));
        let policy = RotationPolicy {
            conditional_write: false,
            ..RotationPolicy::new(ten_hours())
        };
        let service = service_with(store.clone(), policy);

        let outcome = service.verify_and_rotate(input("u1", "abc", t0())).await;

        assert_eq!(outcome, VerificationOutcome::Rotated);
        assert_eq!(
            store.inner.read(&owner("u1")).await.unwrap().unwrap().value,
            TokenValue::from("tok-1")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_presenters_get_one_rotation() {
        let store = seeded(stored("u1", "abc", t0())).await;
        let service = Arc::new(service_with(store, RotationPolicy::new(ten_hours())));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service.verify_and_rotate(input("u1", "abc", t0())).await
                })
            })
            .collect();

        let mut rotated = 0;
        for handle in handles {
            if handle.await.unwrap().is_rotated() {
                rotated += 1;
            }
        }
        assert_eq!(rotated, 1);
    }

    #[tokio::test]
    async fn owners_are_independent() {
        let store = seeded(stored("u1", "abc", t0())).await;
        store.inner.write(&owner("u2"), &stored("u2", "abc", t0())).await.unwrap();
        let service = service_with(store.clone(), RotationPolicy::new(ten_hours()));

        assert!(service.verify_and_rotate(input("u1", "abc", t0())).await.is_rotated());
        assert!(service.verify_and_rotate(input("u2", "abc", t0())).await.is_rotated());
        assert_eq!(
            service.verify_and_rotate(input("u2", "tok-1", t0())).await,
            VerificationOutcome::Rejected(RejectReason::Mismatch)
        );
    }

    #[tokio::test]
    async fn issue_replaces_previous_record() {
        let store = seeded(stored("u1", "abc", t0())).await;
        let service = service_with(store.clone(), RotationPolicy::new(ten_hours()));

        let issued = service
            .issue(&owner("u1"), t0(), WindowHours::new(2.5).unwrap())
            .await
            .unwrap();

        assert_eq!(issued.value, TokenValue::from("tok-1"));
        assert_eq!(issued.expires_at, t0() + Duration::minutes(150));
        assert_eq!(store.inner.read(&owner("u1")).await.unwrap(), Some(issued));
        assert_eq!(
            service.verify_and_rotate(input("u1", "abc", t0())).await,
            VerificationOutcome::Rejected(RejectReason::Mismatch)
        );
    }

    #[tokio::test]
    async fn issue_surfaces_store_errors() {
        let store = Arc::new(ScriptedStore::default());
        store.fail_writes.store(true, Ordering::SeqCst);
        let service = service_with(store, RotationPolicy::new(ten_hours()));

        let err = service.issue(&owner("u1"), t0(), ten_hours()).await;
        assert!(matches!(err, Err(RotationError::Store(_))));
    }
}
