use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::{DEFAULT_REQUEST_TIMEOUT_MS, Settings};
use anyhow::anyhow;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

pub struct Server {
    pub rotation_service: Arc<dyn RotationService>,
    /// Upper bound on one verification round-trip, store included.
    pub request_timeout: Duration,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        let policy = settings.token.policy();
        let token_codec: Arc<dyn TokenCodec> = Arc::new(UuidTokenCodec::new());
        let mut pool = None;

        let rotation_service: Arc<dyn RotationService> = match settings.token.backend.as_str() {
            "fake" => Arc::new(FakeRotationService::new(policy)),
            "memory" => {
                let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
                Arc::new(RealRotationService::new(store, token_codec, policy))
            }
            "redis" => {
                let redis_settings = settings
                    .redis
                    .as_ref()
                    .ok_or_else(|| anyhow!("missing [redis] settings"))?;
                let redis_client = redis::Client::open(redis_settings.dsn.as_str())?;
                let redis_manager = redis_client.get_connection_manager().await?;
                let store: Arc<dyn TokenStore> = Arc::new(RedisTokenStore::new(
                    redis_manager,
                    settings.token.key_prefix.clone(),
                ));
                Arc::new(RealRotationService::new(store, token_codec, policy))
            }
            "mysql" => {
                let mysql_settings = settings
                    .mysql
                    .as_ref()
                    .ok_or_else(|| anyhow!("missing [mysql] settings"))?;
                let mysql_pool = Pool::<MySql>::connect(&mysql_settings.dsn).await?;
                let mysql_store = MySqlTokenStore::new(mysql_pool.clone());
                mysql_store.ensure_schema().await?;
                let store: Arc<dyn TokenStore> = Arc::new(mysql_store);
                pool = Some(mysql_pool);
                Arc::new(RealRotationService::new(store, token_codec, policy))
            }
            other => return Err(anyhow!("Unknown token backend: {}", other)),
        };

        info!(
            backend = %settings.token.backend,
            window = %policy.window,
            enforce_expiry = policy.enforce_expiry,
            conditional_write = policy.conditional_write,
            request_timeout_ms = settings.http.request_timeout_ms,
            "server started"
        );

        Ok(Self {
            rotation_service,
            request_timeout: settings.http.request_timeout(),
            pool,
        })
    }

    /// Server around an already-built service, no owned connections.
    pub fn with_service(rotation_service: Arc<dyn RotationService>) -> Self {
        Self {
            rotation_service,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            pool: None,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("mysql pool closed");
        }
    }
}
