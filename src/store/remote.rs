use async_trait::async_trait;
use deadpool_redis::Config;
use deadpool_redis::Pool;
use deadpool_redis::Runtime;
use redis::AsyncCommands;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::CacheStore;

pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// Remote key-value store on Redis. Entries are written with `SET .. EX`, so expiry is Redis' own.
///
/// Every operation, including acquiring a pooled connection, is bounded by the operation timeout.
#[derive(Clone)]
pub struct RedisStore {
    pool:       Pool,
    op_timeout: Duration,
}

impl RedisStore {
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = Config::from_url(url).create_pool(Some(Runtime::Tokio1))?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: Pool) -> Self {
        Self {
            pool,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    pub fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.op_timeout))?
    }
}

impl Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("op_timeout", &self.op_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.bounded(async {
            let mut conn = self.pool.get().await?;
            Ok::<_, StoreError>(conn.get::<_, Option<Vec<u8>>>(key).await?)
        })
        .await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        // Redis rejects EX 0; sub-second TTLs are rounded up.
        let ttl_secs = ttl.as_secs().max(1);
        self.bounded(async {
            let mut conn = self.pool.get().await?;
            conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
            debug!(key = %key, ttl_secs, "redis SET EX");
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.bounded(async {
            let mut conn = self.pool.get().await?;
            conn.del::<_, ()>(key).await?;
            Ok::<_, StoreError>(())
        })
        .await
    }
}
