//! # contact-cache
//!
//! Cache-aside coordination for a contact store.
//!
//! The crate keeps a key-value cache coherent with an authoritative contact repository. The repository is always the
//! source of truth; the cache is a disposable accelerator that may be unavailable, stale within its TTL, or corrupted
//! without ever affecting correctness.
//!
//! # The Basics
//!
//! - Reads ask the cache first. A miss, an unreachable cache, or an entry that can't be decoded all fall back to the
//!   repository, and the result is written back to the cache.
//! - Writes go to the repository first. Only after it has accepted the change is the cache reconciled: a new record is
//!   written into the cache along with a freshly read list snapshot, updates and deletes drop the affected entries.
//! - Two kinds of keys exist: `contact_{id}` for a single record and `contact_list` for the snapshot of all records.
//!   An empty snapshot is never cached.
//! - Every entry expires after the configured TTL, 5 minutes unless configured otherwise.
//!
//! Both ends are pluggable via the [`Repository`] and [`CacheStore`] traits. The crate ships an in-process
//! [`MokaStore`](store::MokaStore), a Redis-backed [`RedisStore`](store::RedisStore) (feature `redis`), an in-memory
//! [`MemoryRepository`](repository::MemoryRepository) and a SeaORM-backed
//! [`SeaOrmRepository`](repository::SeaOrmRepository) (features `sqlite` or `pg`).
//!
//! # Accounts
//!
//! The [`accounts`] module implements registration and login over a [`UserStore`](traits::UserStore), with passwords
//! kept as salted PBKDF2 hashes produced by [`credentials`].
//!
//! # Events
//!
//! Successful mutations can be announced through an [`EventPublisher`](traits::EventPublisher). The
//! [`BroadcastPublisher`](events::BroadcastPublisher) fans them out to in-process subscribers.

pub mod accounts;
pub mod cache;
pub mod codec;
pub mod config;
pub mod credentials;
pub mod error;
pub mod events;
pub mod repository;
pub mod store;
pub mod traits;
pub mod types;

#[doc(inline)]
pub use cache::CacheAside;
#[doc(inline)]
pub use config::CacheConfig;
#[doc(inline)]
pub use error::CacheAsideError;
#[doc(inline)]
pub use traits::CacheStore;
#[doc(inline)]
pub use traits::Repository;

pub mod prelude {
    pub use crate::accounts::Accounts;
    pub use crate::cache::CacheAside;
    pub use crate::config::CacheConfig;
    pub use crate::error::AccountError;
    pub use crate::error::CacheAsideError;
    pub use crate::error::StoreError;
    pub use crate::events::BroadcastPublisher;
    pub use crate::repository::MemoryRepository;
    pub use crate::repository::MemoryUserStore;
    pub use crate::store::MokaStore;
    pub use crate::traits::*;
    pub use crate::types::*;
}
