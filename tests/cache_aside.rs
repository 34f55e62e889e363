use async_trait::async_trait;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use contact_cache::codec;
use contact_cache::events::BroadcastPublisher;
use contact_cache::prelude::*;
use contact_cache::test::sample_contact;
use contact_cache::test::CountingRepository;
use contact_cache::test::FlakyStore;
use contact_cache::test::RecordingPublisher;
use contact_cache::test::StoreCalls;

type Repo = CountingRepository<MemoryRepository>;

struct Fixture {
    cache:  CacheAside<Repo, FlakyStore>,
    repo:   Arc<Repo>,
    store:  Arc<FlakyStore>,
    events: Arc<RecordingPublisher>,
}

impl Fixture {
    fn new(repository: MemoryRepository) -> Self {
        Self::with_config(repository, CacheConfig::default())
    }

    fn with_config(repository: MemoryRepository, config: CacheConfig) -> Self {
        let repo = Arc::new(CountingRepository::new(repository));
        let store = Arc::new(FlakyStore::new(MokaStore::default()));
        let events = Arc::new(RecordingPublisher::default());
        let cache = CacheAside::builder()
            .repository(repo.clone())
            .store(store.clone())
            .config(config)
            .publisher(events.clone())
            .build()
            .expect("coordinator must build");
        Self {
            cache,
            repo,
            store,
            events,
        }
    }

    // Reads the backing store directly, bypassing counters and outages.
    async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.store.inner().get(key).await.unwrap()
    }

    async fn plant(&self, key: &str, bytes: &[u8]) {
        self.store
            .inner()
            .set(key, bytes.to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
    }
}

fn contact(id: ContactId, name: &str, email: &str) -> Contact {
    Contact {
        id,
        name: name.into(),
        email: email.into(),
        ..Default::default()
    }
}

fn two_contacts() -> MemoryRepository {
    MemoryRepository::with_records([
        contact(1, "John Doe", "john@example.com"),
        contact(2, "Jane Roe", "jane@example.com"),
    ])
}

#[tokio::test]
async fn add_alice_populates_both_keys() {
    let fx = Fixture::new(two_contacts());

    let added = fx
        .cache
        .add(ContactDto {
            id: 3,
            name: "Alice Smith".into(),
            email: "alice@example.com".into(),
            ..Default::default()
        })
        .await
        .unwrap()
        .expect("insert must be accepted");
    assert_eq!(added.id, 3);

    let record = fx.raw("contact_3").await.expect("record key must be cached");
    assert!(String::from_utf8(record).unwrap().contains("Alice Smith"));

    let list = codec::decode_contacts(&fx.raw("contact_list").await.expect("list must be cached")).unwrap();
    assert_eq!(list.len(), 3);
    assert!(list.iter().any(|c| c.id == 3 && c.email == "alice@example.com"));

    let before = fx.repo.calls();
    let fetched = fx.cache.get_by_id(3).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Alice Smith");
    assert_eq!(fx.repo.calls(), before, "get_by_id(3) must be served from the cache");
}

#[tokio::test]
async fn inserted_record_survives_an_empty_cache() {
    let fx = Fixture::new(MemoryRepository::new());
    let added = fx
        .cache
        .add(sample_contact("Bob", "bob@example.com"))
        .await
        .unwrap()
        .unwrap();

    fx.store.inner().delete("contact_1").await.unwrap();
    fx.store.inner().delete("contact_list").await.unwrap();

    let fetched = fx.cache.get_by_id(added.id).await.unwrap();
    assert_eq!(fetched, Some(added));
    assert_eq!(fx.repo.calls().fetch_by_id, 1);
    assert!(fx.raw("contact_1").await.is_some(), "miss must repopulate the record key");
}

#[tokio::test]
async fn update_invalidates_instead_of_serving_stale_data() {
    let fx = Fixture::new(two_contacts());
    fx.cache.get_by_id(1).await.unwrap();
    fx.cache.get_all().await.unwrap();
    assert!(fx.raw("contact_1").await.is_some());
    assert!(fx.raw("contact_list").await.is_some());

    let changed = ContactDto {
        name: "John Q. Doe".into(),
        ..fx.cache.get_by_id(1).await.unwrap().unwrap()
    };
    assert!(fx.cache.update(1, changed).await.unwrap());

    assert!(fx.raw("contact_1").await.is_none());
    assert!(fx.raw("contact_list").await.is_none());

    let fetched = fx.cache.get_by_id(1).await.unwrap().unwrap();
    assert_eq!(fetched.name, "John Q. Doe");
    assert_eq!(fetched.id, 1);
}

#[tokio::test]
async fn update_of_missing_record_leaves_cache_alone() {
    let fx = Fixture::new(two_contacts());
    fx.cache.get_all().await.unwrap();
    let writes = fx.store.calls();

    assert!(!fx.cache.update(42, sample_contact("Nobody", "no@example.com")).await.unwrap());
    assert_eq!(fx.repo.calls().update, 0);
    assert_eq!(fx.store.calls(), writes);
    assert!(fx.raw("contact_list").await.is_some());
}

#[tokio::test]
async fn delete_clears_both_keys() {
    let fx = Fixture::new(two_contacts());
    fx.cache.get_by_id(2).await.unwrap();
    fx.cache.get_all().await.unwrap();

    assert!(fx.cache.delete(2).await.unwrap());
    assert!(fx.raw("contact_2").await.is_none());
    assert!(fx.raw("contact_list").await.is_none());
    assert_eq!(fx.cache.get_by_id(2).await.unwrap(), None);

    let all = fx.cache.get_all().await.unwrap();
    assert_eq!(all.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1]);
}

#[tokio::test]
async fn delete_of_missing_record() {
    let fx = Fixture::new(two_contacts());
    assert!(!fx.cache.delete(9).await.unwrap());
    assert_eq!(fx.store.calls().delete, 0);
    assert!(fx.events.events().is_empty());
}

#[tokio::test]
async fn empty_repository_is_not_cached() {
    let fx = Fixture::new(MemoryRepository::new());
    assert!(fx.cache.get_all().await.unwrap().is_empty());
    assert!(fx.cache.get_all().await.unwrap().is_empty());

    assert!(fx.raw("contact_list").await.is_none());
    assert_eq!(fx.store.calls().set, 0);
    assert_eq!(fx.repo.calls().fetch_all, 2);
}

#[tokio::test]
async fn list_snapshot_is_served_from_cache() {
    let fx = Fixture::new(two_contacts());
    let first = fx.cache.get_all().await.unwrap();
    let second = fx.cache.get_all().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(fx.repo.calls().fetch_all, 1);
}

#[tokio::test]
async fn unknown_id_is_not_cached() {
    let fx = Fixture::new(two_contacts());
    assert_eq!(fx.cache.get_by_id(77).await.unwrap(), None);
    assert!(fx.raw("contact_77").await.is_none());
    assert_eq!(fx.store.calls().set, 0);
}

#[tokio::test]
async fn read_outage_falls_back_to_repository() {
    let fx = Fixture::new(two_contacts());
    fx.cache.get_by_id(1).await.unwrap();
    fx.store.set_down(true);

    let fetched = fx.cache.get_by_id(1).await.unwrap().unwrap();
    assert_eq!(fetched.name, "John Doe");
    assert_eq!(fx.repo.calls().fetch_by_id, 2);

    assert_eq!(fx.cache.get_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn write_outage_does_not_fail_mutations() {
    let fx = Fixture::new(two_contacts());
    fx.store.set_down(true);

    let added = fx
        .cache
        .add(sample_contact("Carol", "carol@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(added.id, 3);
    assert!(fx.cache.update(3, sample_contact("Caroline", "carol@example.com")).await.unwrap());
    assert!(fx.cache.delete(3).await.unwrap());

    fx.store.set_down(false);
    assert_eq!(fx.store.inner().entry_count().await, 0);
    assert_eq!(fx.events.events().len(), 3);
}

#[tokio::test]
async fn corrupted_entry_is_a_miss() {
    let fx = Fixture::new(two_contacts());
    fx.plant("contact_1", b"\x00not json").await;
    fx.plant("contact_list", b"[{\"id\":").await;

    assert_eq!(fx.cache.get_by_id(1).await.unwrap().unwrap().name, "John Doe");
    assert_eq!(fx.cache.get_all().await.unwrap().len(), 2);
    assert_eq!(fx.repo.calls().fetch_by_id, 1);
    assert_eq!(fx.repo.calls().fetch_all, 1);

    // Overwritten with well-formed data on the way back.
    let repaired = codec::decode_contact(&fx.raw("contact_1").await.unwrap()).unwrap();
    assert_eq!(repaired.id, 1);
}

#[tokio::test]
async fn legacy_entry_is_a_hit() {
    let fx = Fixture::new(two_contacts());
    fx.plant(
        "contact_1",
        br#"{"Id":1,"Name":"Legacy Doe","Email":"legacy@example.com","Phone":"","Address":"","UserId":5}"#,
    )
    .await;

    let fetched = fx.cache.get_by_id(1).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Legacy Doe");
    assert_eq!(fetched.user_id, 5);
    assert_eq!(fx.repo.calls().total(), 0);
}

#[tokio::test]
async fn repository_failure_is_reported() {
    let fx = Fixture::new(two_contacts());
    fx.repo.set_failing(true);

    let err = fx.cache.get_all().await.unwrap_err();
    assert!(matches!(err, CacheAsideError::Repository { op: "fetch all contacts", .. }));
    assert!(err.to_string().contains("simulated repository failure"));

    assert!(fx.cache.get_by_id(1).await.is_err());
    assert!(fx.cache.add(sample_contact("Dan", "dan@example.com")).await.is_err());
    assert!(fx.cache.update(1, sample_contact("Dan", "dan@example.com")).await.is_err());
    assert!(fx.cache.delete(1).await.is_err());

    assert_eq!(fx.store.calls().set, 0);
    assert_eq!(fx.store.calls().delete, 0);
    assert!(fx.events.events().is_empty());
}

#[tokio::test]
async fn declined_insert_touches_nothing() {
    let fx = Fixture::new(two_contacts());
    fx.repo.set_decline_insert(true);

    assert_eq!(fx.cache.add(sample_contact("Eve", "eve@example.com")).await.unwrap(), None);
    assert_eq!(fx.store.calls(), StoreCalls::default());
    assert_eq!(fx.repo.calls().fetch_all, 0);
    assert!(fx.events.events().is_empty());
}

#[tokio::test]
async fn events_follow_successful_mutations() {
    let fx = Fixture::new(MemoryRepository::new());

    let added = fx
        .cache
        .add(sample_contact("Frank", "frank@example.com"))
        .await
        .unwrap()
        .unwrap();
    let renamed = ContactDto {
        name: "Franklin".into(),
        ..added.clone()
    };
    assert!(fx.cache.update(added.id, renamed.clone()).await.unwrap());
    assert!(!fx.cache.update(99, renamed.clone()).await.unwrap());
    assert!(fx.cache.delete(added.id).await.unwrap());
    assert!(!fx.cache.delete(added.id).await.unwrap());

    assert_eq!(
        fx.events.events(),
        vec![
            DomainEvent::ContactCreated(added.into()),
            DomainEvent::ContactUpdated(renamed.into()),
            DomainEvent::ContactDeleted { id: 1 },
        ]
    );
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let fx = Fixture::with_config(two_contacts(), CacheConfig::new(Duration::from_secs(1)));
    assert_eq!(fx.cache.ttl(), Duration::from_secs(1));

    fx.cache.get_by_id(1).await.unwrap();
    fx.cache.get_by_id(1).await.unwrap();
    assert_eq!(fx.repo.calls().fetch_by_id, 1);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    fx.cache.get_by_id(1).await.unwrap();
    assert_eq!(fx.repo.calls().fetch_by_id, 2);
}

#[tokio::test]
async fn defaults_without_config_or_publisher() {
    let cache = CacheAside::builder()
        .repository(Arc::new(two_contacts()))
        .store(Arc::new(MokaStore::default()))
        .build()
        .unwrap();
    assert_eq!(cache.ttl(), Duration::from_secs(300));
    assert_eq!(cache.config(), CacheConfig::default());
    assert!(cache.delete(1).await.unwrap());
}

#[tokio::test]
async fn broadcast_subscribers_see_creations() {
    let publisher = Arc::new(BroadcastPublisher::default());
    let mut events = publisher.subscribe();
    let cache = CacheAside::builder()
        .repository(Arc::new(MemoryRepository::new()))
        .store(Arc::new(MokaStore::default()))
        .publisher(publisher.clone())
        .build()
        .unwrap();

    let added = cache
        .add(sample_contact("Grace", "grace@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(events.recv().await.unwrap(), DomainEvent::ContactCreated(added.into()));
}

// Passes the existence check, then loses the record before the update lands.
#[derive(Debug, Default)]
struct VanishingRepository {
    inner: MemoryRepository,
}

#[async_trait]
impl Repository for VanishingRepository {
    type Error = Infallible;

    async fn fetch_all(&self) -> Result<Vec<Contact>, Self::Error> {
        self.inner.fetch_all().await
    }

    async fn fetch_by_id(&self, id: ContactId) -> Result<Option<Contact>, Self::Error> {
        Ok(Some(contact(id, "Ghost", "ghost@example.com")))
    }

    async fn insert(&self, contact: Contact) -> Result<Option<Contact>, Self::Error> {
        self.inner.insert(contact).await
    }

    async fn update(&self, _id: ContactId, _contact: Contact) -> Result<Option<Contact>, Self::Error> {
        Ok(None)
    }

    async fn delete(&self, id: ContactId) -> Result<bool, Self::Error> {
        self.inner.delete(id).await
    }
}

#[tokio::test]
async fn update_racing_a_delete_still_invalidates() {
    let store = Arc::new(FlakyStore::new(MokaStore::default()));
    let events = Arc::new(RecordingPublisher::default());
    let cache = CacheAside::builder()
        .repository(Arc::new(VanishingRepository::default()))
        .store(store.clone())
        .publisher(events.clone())
        .build()
        .unwrap();

    cache.get_by_id(5).await.unwrap();
    assert!(store.inner().get("contact_5").await.unwrap().is_some());

    assert!(!cache.update(5, sample_contact("Ghost", "ghost@example.com")).await.unwrap());
    assert!(store.inner().get("contact_5").await.unwrap().is_none());
    assert!(events.events().is_empty());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListMode {
    Normal,
    Failing,
    Empty,
}

// Contact store whose `fetch_all` can be broken independently of the other operations.
#[derive(Debug)]
struct ListingRepository {
    inner: MemoryRepository,
    mode:  parking_lot::Mutex<ListMode>,
}

impl ListingRepository {
    fn new(inner: MemoryRepository) -> Self {
        Self {
            inner,
            mode: parking_lot::Mutex::new(ListMode::Normal),
        }
    }

    fn set_mode(&self, mode: ListMode) {
        *self.mode.lock() = mode;
    }
}

#[async_trait]
impl Repository for ListingRepository {
    type Error = String;

    async fn fetch_all(&self) -> Result<Vec<Contact>, Self::Error> {
        let mode = *self.mode.lock();
        match mode {
            ListMode::Normal => Ok(self.inner.fetch_all().await.unwrap_or_default()),
            ListMode::Failing => Err("listing unavailable".into()),
            ListMode::Empty => Ok(Vec::new()),
        }
    }

    async fn fetch_by_id(&self, id: ContactId) -> Result<Option<Contact>, Self::Error> {
        self.inner.fetch_by_id(id).await.map_err(|err| err.to_string())
    }

    async fn insert(&self, contact: Contact) -> Result<Option<Contact>, Self::Error> {
        self.inner.insert(contact).await.map_err(|err| err.to_string())
    }

    async fn update(&self, id: ContactId, contact: Contact) -> Result<Option<Contact>, Self::Error> {
        self.inner.update(id, contact).await.map_err(|err| err.to_string())
    }

    async fn delete(&self, id: ContactId) -> Result<bool, Self::Error> {
        self.inner.delete(id).await.map_err(|err| err.to_string())
    }
}

async fn listing_cache(
    mode: ListMode,
) -> (
    CacheAside<ListingRepository, FlakyStore>,
    Arc<FlakyStore>,
    Arc<RecordingPublisher>,
) {
    let repo = Arc::new(ListingRepository::new(MemoryRepository::new()));
    let store = Arc::new(FlakyStore::new(MokaStore::default()));
    let events = Arc::new(RecordingPublisher::default());
    let cache = CacheAside::builder()
        .repository(repo.clone())
        .store(store.clone())
        .publisher(events.clone())
        .build()
        .unwrap();

    cache
        .add(sample_contact("Ann", "ann@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert!(store.inner().get("contact_list").await.unwrap().is_some());

    repo.set_mode(mode);
    (cache, store, events)
}

#[tokio::test]
async fn add_drops_list_when_refetch_fails() {
    let (cache, store, events) = listing_cache(ListMode::Failing).await;

    let added = cache
        .add(sample_contact("Ben", "ben@example.com"))
        .await
        .unwrap()
        .expect("the insert itself succeeded");
    assert_eq!(added.id, 2);

    let record = store.inner().get("contact_2").await.unwrap().expect("record key is written");
    assert_eq!(codec::decode_contact(&record).unwrap().name, "Ben");
    assert!(store.inner().get("contact_list").await.unwrap().is_none());
    assert_eq!(events.events().len(), 2);
}

#[tokio::test]
async fn add_drops_list_when_refetch_is_empty() {
    let (cache, store, _events) = listing_cache(ListMode::Empty).await;

    let added = cache
        .add(sample_contact("Ben", "ben@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert!(store.inner().get(&format!("contact_{}", added.id)).await.unwrap().is_some());
    assert!(store.inner().get("contact_list").await.unwrap().is_none());
}
