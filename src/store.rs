//! [`CacheStore`](crate::traits::CacheStore) backends.
pub mod local;
#[cfg(feature = "redis")]
pub mod remote;

pub use local::MokaStore;
#[cfg(feature = "redis")]
pub use remote::RedisStore;
