use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;

/// Identifier of a contact record. Assigned by the repository.
pub type ContactId = i32;

/// A contact as it is kept by the backing repository and in the cache.
///
/// Cached values are written with snake_case field names. PascalCase names are accepted on read so that entries
/// written by older deployments remain decodable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contact {
    #[serde(alias = "Id")]
    pub id:      ContactId,
    #[serde(alias = "Name")]
    pub name:    String,
    #[serde(alias = "Email")]
    pub email:   String,
    #[serde(alias = "Phone", default)]
    pub phone:   String,
    #[serde(alias = "Address", default)]
    pub address: String,
    #[serde(alias = "UserId", default)]
    pub user_id: i32,
}

/// The caller-facing representation of a contact. `id` is `0` until the repository assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactDto {
    #[serde(default)]
    pub id:      ContactId,
    pub name:    String,
    pub email:   String,
    #[serde(default)]
    pub phone:   String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub user_id: i32,
}

impl From<ContactDto> for Contact {
    fn from(dto: ContactDto) -> Self {
        Self {
            id:      dto.id,
            name:    dto.name,
            email:   dto.email,
            phone:   dto.phone,
            address: dto.address,
            user_id: dto.user_id,
        }
    }
}

impl From<Contact> for ContactDto {
    fn from(contact: Contact) -> Self {
        Self {
            id:      contact.id,
            name:    contact.name,
            email:   contact.email,
            phone:   contact.phone,
            address: contact.address,
            user_id: contact.user_id,
        }
    }
}

/// Cache keys used by [`CacheAside`](crate::CacheAside).
///
/// The string forms are fixed: `contact_{id}` for a single record and `contact_list` for the collection snapshot.
/// Other deployments sharing the same key-value store rely on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Record(ContactId),
    List,
}

impl CacheKey {
    pub const LIST: &'static str = "contact_list";
    pub const RECORD_PREFIX: &'static str = "contact_";
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Record(id) => write!(f, "{}{id}", Self::RECORD_PREFIX),
            Self::List => f.write_str(Self::LIST),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// A registered user. The password hash never leaves the process in serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id:            i32,
    pub first_name:    String,
    pub last_name:     String,
    pub email:         String,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(rename = "user_role", default)]
    pub role:          Role,
}

/// Input of [`Accounts::register`](crate::accounts::Accounts::register).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub first_name: String,
    pub last_name:  String,
    pub email:      String,
    pub password:   String,
    #[serde(default)]
    pub role:       Role,
}

/// State changes announced to external systems through an [`EventPublisher`](crate::traits::EventPublisher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum DomainEvent {
    ContactCreated(Contact),
    ContactUpdated(Contact),
    ContactDeleted {
        id: ContactId,
    },
    UserRegistered {
        first_name: String,
        last_name:  String,
        email:      String,
    },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ContactCreated(_) => "ContactCreated",
            Self::ContactUpdated(_) => "ContactUpdated",
            Self::ContactDeleted { .. } => "ContactDeleted",
            Self::UserRegistered { .. } => "UserRegistered",
        }
    }
}
