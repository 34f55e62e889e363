use async_trait::async_trait;
use std::fmt::Debug;
use std::fmt::Display;
use std::time::Duration;

use crate::error::StoreError;
use crate::types::Contact;
use crate::types::ContactId;
use crate::types::DomainEvent;
use crate::types::UserAccount;

// For types that are in charge of durably reading/writing contact records.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    type Error: Display + Debug + Send + Sync + 'static;

    /// All records, ordered by id. An empty store is an empty vector, not an error.
    async fn fetch_all(&self) -> Result<Vec<Contact>, Self::Error>;
    async fn fetch_by_id(&self, id: ContactId) -> Result<Option<Contact>, Self::Error>;
    /// Returns the stored record with its assigned id, or `None` if the store declined the insert. The `id` of the
    /// incoming record is ignored.
    async fn insert(&self, contact: Contact) -> Result<Option<Contact>, Self::Error>;
    /// Replaces every mutable field of record `id`. `None` means there is no such record.
    async fn update(&self, id: ContactId, contact: Contact) -> Result<Option<Contact>, Self::Error>;
    /// `false` means there is no such record.
    async fn delete(&self, id: ContactId) -> Result<bool, Self::Error>;
}

/// Capability-scoped access to a key-value store with native TTL expiry.
///
/// Implementations must be safe for concurrent use. All operations are best-effort from the coordinator's point of
/// view: errors are logged and never fail the calling operation.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError>;
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Fire-and-forget publication of state changes to external systems.
pub trait EventPublisher: Send + Sync + 'static {
    fn publish(&self, event: DomainEvent);
}

#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    type Error: Display + Debug + Send + Sync + 'static;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, Self::Error>;
    /// Returns the stored account with its assigned id, or `None` if the store declined it.
    async fn insert(&self, account: UserAccount) -> Result<Option<UserAccount>, Self::Error>;
    async fn update_password(&self, id: i32, password_hash: String) -> Result<bool, Self::Error>;
}
