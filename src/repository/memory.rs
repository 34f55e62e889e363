use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use tracing::debug;

use crate::traits::Repository;
use crate::traits::UserStore;
use crate::types::Contact;
use crate::types::ContactId;
use crate::types::UserAccount;

/// Process-local contact repository with auto-increment ids starting at 1.
#[derive(Debug)]
pub struct MemoryRepository {
    records: RwLock<BTreeMap<ContactId, Contact>>,
    next_id: AtomicI64,
}

// Hands out the next id, or `None` once the `i32` range is used up.
fn allocate_id(next_id: &AtomicI64) -> Option<i32> {
    let id = i32::try_from(next_id.fetch_add(1, Ordering::SeqCst)).ok();
    if id.is_none() {
        debug!("id space exhausted");
    }
    id
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Pre-populate with records that already carry their ids. Later inserts continue after the highest id.
    pub fn with_records(records: impl IntoIterator<Item = Contact>) -> Self {
        let records = records.into_iter().map(|c| (c.id, c)).collect::<BTreeMap<_, _>>();
        let next_id = records.keys().next_back().map_or(1, |id| i64::from(*id) + 1);
        Self {
            records: RwLock::new(records),
            next_id: AtomicI64::new(next_id),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    type Error = Infallible;

    async fn fetch_all(&self) -> Result<Vec<Contact>, Self::Error> {
        Ok(self.records.read().values().cloned().collect())
    }

    async fn fetch_by_id(&self, id: ContactId) -> Result<Option<Contact>, Self::Error> {
        Ok(self.records.read().get(&id).cloned())
    }

    async fn insert(&self, mut contact: Contact) -> Result<Option<Contact>, Self::Error> {
        let Some(id) = allocate_id(&self.next_id)
        else {
            return Ok(None);
        };
        contact.id = id;
        self.records.write().insert(contact.id, contact.clone());
        Ok(Some(contact))
    }

    async fn update(&self, id: ContactId, contact: Contact) -> Result<Option<Contact>, Self::Error> {
        let mut records = self.records.write();
        Ok(records.get_mut(&id).map(|existing| {
            *existing = Contact { id, ..contact };
            existing.clone()
        }))
    }

    async fn delete(&self, id: ContactId) -> Result<bool, Self::Error> {
        Ok(self.records.write().remove(&id).is_some())
    }
}

/// Process-local user store. Emails are unique, compared case-insensitively.
#[derive(Debug)]
pub struct MemoryUserStore {
    users:   RwLock<BTreeMap<i32, UserAccount>>,
    next_id: AtomicI64,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users:   RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    type Error = Infallible;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, Self::Error> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert(&self, mut account: UserAccount) -> Result<Option<UserAccount>, Self::Error> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&account.email)) {
            return Ok(None);
        }
        let Some(id) = allocate_id(&self.next_id)
        else {
            return Ok(None);
        };
        account.id = id;
        users.insert(account.id, account.clone());
        Ok(Some(account))
    }

    async fn update_password(&self, id: i32, password_hash: String) -> Result<bool, Self::Error> {
        Ok(self
            .users
            .write()
            .get_mut(&id)
            .map(|u| u.password_hash = password_hash)
            .is_some())
    }
}
