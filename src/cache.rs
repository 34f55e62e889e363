use fieldx::fxstruct;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

use crate::codec;
use crate::config::CacheConfig;
use crate::error::CacheAsideError;
use crate::error::Result;
use crate::traits::CacheStore;
use crate::traits::EventPublisher;
use crate::traits::Repository;
use crate::types::CacheKey;
use crate::types::Contact;
use crate::types::ContactDto;
use crate::types::ContactId;
use crate::types::DomainEvent;

/// Keeps a key-value cache coherent with a contact repository.
///
/// Reads go to the cache first and fall back to the repository on a miss, populating the cache on the way back.
/// Writes go to the repository first; only once it has succeeded is the cache reconciled. The repository is always
/// the source of truth, the cache is disposable: every cache failure degrades to a repository call and is never
/// reported to the caller.
///
/// ```ignore
/// let cache = CacheAside::builder()
///     .repository(Arc::new(repository))
///     .store(Arc::new(MokaStore::default()))
///     .config(CacheConfig::from_env())
///     .build()?;
///
/// let created = cache.add(dto).await?;
/// let contact = cache.get_by_id(created.unwrap().id).await?;
/// ```
///
/// The coordinator holds no mutable state and can be shared between tasks behind an `Arc`. Concurrent writers to the
/// same id are not serialized; each of them invalidates the same keys, which is harmless.
#[fxstruct(
    no_new,
    default(off),
    builder(
        doc("Builder object of [`CacheAside`].", "", "See [`CacheAside::builder()`] method."),
        method_doc("Implement builder pattern for [`CacheAside`]."),
    )
)]
pub struct CacheAside<R, S>
where
    R: Repository,
    S: CacheStore,
{
    #[fieldx(get(clone))]
    repository: Arc<R>,

    #[fieldx(get(clone))]
    store: Arc<S>,

    /// Read once here; there is no way to change it afterwards.
    #[fieldx(get(copy), default(CacheConfig::default()))]
    config: CacheConfig,

    /// Receives an event after every successful mutation. Without one nothing is published.
    #[fieldx(optional)]
    publisher: Arc<dyn EventPublisher>,
}

impl<R, S> CacheAside<R, S>
where
    R: Repository,
    S: CacheStore,
{
    #[inline]
    pub fn ttl(&self) -> Duration {
        self.config.ttl()
    }

    /// All contacts. Served from the `contact_list` snapshot when it is cached.
    #[instrument(level = "trace", skip(self))]
    pub async fn get_all(&self) -> Result<Vec<ContactDto>> {
        if let Some(contacts) = self.cached_list().await {
            debug!(count = contacts.len(), "contact list served from cache");
            return Ok(contacts.into_iter().map(ContactDto::from).collect());
        }

        let contacts = self
            .repository
            .fetch_all()
            .await
            .map_err(|err| CacheAsideError::repository("fetch all contacts", err))?;

        // An empty snapshot is never cached.
        if !contacts.is_empty() {
            self.put_list(&contacts).await;
        }

        Ok(contacts.into_iter().map(ContactDto::from).collect())
    }

    /// A single contact, `None` if the repository doesn't know it.
    #[instrument(level = "trace", skip(self))]
    pub async fn get_by_id(&self, id: ContactId) -> Result<Option<ContactDto>> {
        if let Some(contact) = self.cached_contact(id).await {
            debug!(id, "contact served from cache");
            return Ok(Some(contact.into()));
        }

        let Some(contact) = self
            .repository
            .fetch_by_id(id)
            .await
            .map_err(|err| CacheAsideError::repository("fetch contact", err))?
        else {
            debug!(id, "contact not found");
            return Ok(None);
        };

        self.put_contact(&contact).await;
        Ok(Some(contact.into()))
    }

    /// Create a contact. Returns the accepted record with its assigned id, or `None` if the repository declined it.
    ///
    /// On success both the record entry and the list snapshot are rewritten. The snapshot is re-read from the
    /// repository rather than patched in the cache.
    #[instrument(level = "trace", skip(self, contact), fields(name = %contact.name))]
    pub async fn add(&self, contact: ContactDto) -> Result<Option<ContactDto>> {
        let Some(stored) = self
            .repository
            .insert(contact.into())
            .await
            .map_err(|err| CacheAsideError::repository("insert contact", err))?
        else {
            debug!("repository declined the insert");
            return Ok(None);
        };

        self.put_contact(&stored).await;
        self.refresh_list().await;
        self.publish(DomainEvent::ContactCreated(stored.clone()));

        Ok(Some(stored.into()))
    }

    /// Update contact `id`. `false` if there is no such contact.
    ///
    /// Cached copies are dropped, not rewritten; the next read repopulates them from the repository.
    #[instrument(level = "trace", skip(self, contact))]
    pub async fn update(&self, id: ContactId, contact: ContactDto) -> Result<bool> {
        if self
            .repository
            .fetch_by_id(id)
            .await
            .map_err(|err| CacheAsideError::repository("fetch contact", err))?
            .is_none()
        {
            debug!(id, "nothing to update");
            return Ok(false);
        }

        let updated = self
            .repository
            .update(id, contact.into())
            .await
            .map_err(|err| CacheAsideError::repository("update contact", err))?;

        // Even if the record disappeared since the existence check, the store has changed under any cached copy.
        self.invalidate(id).await;

        let Some(updated) = updated
        else {
            debug!(id, "contact vanished before update");
            return Ok(false);
        };

        self.publish(DomainEvent::ContactUpdated(updated));
        Ok(true)
    }

    /// Delete contact `id`. `false` if there is no such contact.
    #[instrument(level = "trace", skip(self))]
    pub async fn delete(&self, id: ContactId) -> Result<bool> {
        if !self
            .repository
            .delete(id)
            .await
            .map_err(|err| CacheAsideError::repository("delete contact", err))?
        {
            debug!(id, "nothing to delete");
            return Ok(false);
        }

        self.invalidate(id).await;
        self.publish(DomainEvent::ContactDeleted { id });
        Ok(true)
    }

    async fn cache_get(&self, key: CacheKey) -> Option<Vec<u8>> {
        match self.store.get(&key.to_string()).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%key, error = %err, "cache read failed, falling back to repository");
                None
            }
        }
    }

    async fn cache_set(&self, key: CacheKey, bytes: Vec<u8>) {
        if let Err(err) = self.store.set(&key.to_string(), bytes, self.ttl()).await {
            warn!(%key, error = %err, "cache write failed");
        }
    }

    async fn cache_delete(&self, key: CacheKey) {
        if let Err(err) = self.store.delete(&key.to_string()).await {
            warn!(%key, error = %err, "cache delete failed");
        }
    }

    async fn cached_contact(&self, id: ContactId) -> Option<Contact> {
        let key = CacheKey::Record(id);
        let bytes = self.cache_get(key).await?;
        codec::decode_contact(&bytes)
            .inspect_err(|err| warn!(%key, error = %err, "ignoring malformed cache entry"))
            .ok()
    }

    async fn cached_list(&self) -> Option<Vec<Contact>> {
        let key = CacheKey::List;
        let bytes = self.cache_get(key).await?;
        codec::decode_contacts(&bytes)
            .inspect_err(|err| warn!(%key, error = %err, "ignoring malformed cache entry"))
            .ok()
    }

    async fn put_contact(&self, contact: &Contact) {
        let key = CacheKey::Record(contact.id);
        match codec::encode_contact(contact) {
            Ok(bytes) => self.cache_set(key, bytes).await,
            Err(err) => warn!(%key, error = %err, "not caching contact"),
        }
    }

    async fn put_list(&self, contacts: &[Contact]) {
        let key = CacheKey::List;
        match codec::encode_contacts(contacts) {
            Ok(bytes) => self.cache_set(key, bytes).await,
            Err(err) => {
                warn!(%key, error = %err, "not caching contact list");
                self.cache_delete(key).await;
            }
        }
    }

    // Replace the list snapshot with a fresh read of the repository. If no fresh snapshot can be written, whatever
    // is cached is outdated and has to go.
    async fn refresh_list(&self) {
        match self.repository.fetch_all().await {
            Ok(contacts) if !contacts.is_empty() => self.put_list(&contacts).await,
            Ok(_) => self.cache_delete(CacheKey::List).await,
            Err(err) => {
                warn!(error = %err, "failed to re-read contacts, dropping cached list");
                self.cache_delete(CacheKey::List).await;
            }
        }
    }

    async fn invalidate(&self, id: ContactId) {
        self.cache_delete(CacheKey::Record(id)).await;
        self.cache_delete(CacheKey::List).await;
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(publisher) = self.publisher.as_ref() {
            publisher.publish(event);
        }
    }
}

impl<R, S> Debug for CacheAside<R, S>
where
    R: Repository,
    S: CacheStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAside")
            .field("config", &self.config)
            .field("publisher", &self.publisher.is_some())
            .finish_non_exhaustive()
    }
}
