use std::time::Duration;
use thiserror::Error;

/// Failures of a [`CacheStore`](crate::traits::CacheStore) backend. The coordinator never surfaces these to its
/// callers; they are logged and the operation degrades to the repository.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache backend is unavailable: {0}")]
    Unavailable(String),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[cfg(feature = "redis")]
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[cfg(feature = "redis")]
    #[error("redis pool: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[cfg(feature = "redis")]
    #[error("redis pool setup: {0}")]
    CreatePool(#[from] deadpool_redis::CreatePoolError),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode {what}: {source}")]
    Encode {
        what:   &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode {what}: {source}")]
    Decode {
        what:   &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The only failure [`CacheAside`](crate::CacheAside) reports: the backing repository could not complete a call.
/// Not-found outcomes are not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheAsideError {
    #[error("repository failed to {op}: {message}")]
    Repository { op: &'static str, message: String },
}

impl CacheAsideError {
    pub(crate) fn repository<E: std::fmt::Display>(op: &'static str, err: E) -> Self {
        Self::Repository {
            op,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("user store failed to {op}: {message}")]
    Store { op: &'static str, message: String },
}

impl AccountError {
    pub(crate) fn store<E: std::fmt::Display>(op: &'static str, err: E) -> Self {
        Self::Store {
            op,
            message: err.to_string(),
        }
    }
}

pub type Result<T, E = CacheAsideError> = std::result::Result<T, E>;
