use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use contact_cache::events::BroadcastPublisher;
use contact_cache::prelude::*;

/// Walk through the cache-aside contact operations against an in-memory repository.
#[derive(Debug, Clone, Parser)]
#[clap(about, version, name = "contact-cache")]
struct Cli {
    /// Cache entry lifetime in seconds. Invalid values fall back to the default.
    #[clap(long, env = "CONTACT_CACHE_TTL")]
    ttl: Option<String>,

    /// Use a Redis server as the cache instead of the in-process store.
    #[cfg(feature = "redis")]
    #[clap(long, env = "CONTACT_CACHE_REDIS_URL")]
    redis_url: Option<String>,

    /// Silence the output
    #[clap(long, short, env = "CONTACT_CACHE_QUIET", default_value_t = false)]
    quiet: bool,
}

macro_rules! say {
    ($cli:expr, $($arg:tt)*) => {
        if !$cli.quiet {
            println!($($arg)*);
        }
    };
}

fn setup_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}

async fn contacts<S>(cli: &Cli, store: Arc<S>, publisher: Arc<BroadcastPublisher>) -> anyhow::Result<()>
where
    S: CacheStore,
{
    let cache = CacheAside::builder()
        .repository(Arc::new(MemoryRepository::new()))
        .store(store)
        .config(CacheConfig::from_raw(cli.ttl.as_deref()))
        .publisher(publisher)
        .build()?;
    say!(cli, "Cache TTL: {}s", cache.config().ttl_secs());

    for (name, email) in [
        ("John Doe", "john@example.com"),
        ("Jane Roe", "jane@example.com"),
        ("Alice Smith", "alice@example.com"),
    ] {
        let dto = ContactDto {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        };
        let added = cache
            .add(dto)
            .await?
            .with_context(|| format!("repository declined {name}"))?;
        say!(cli, "Added #{}: {} <{}>", added.id, added.name, added.email);
    }

    let alice = cache.get_by_id(3).await?.context("contact 3 is missing")?;
    say!(cli, "Fetched #{}: {}", alice.id, alice.name);

    let renamed = ContactDto {
        name: "Alice Jones".into(),
        ..alice
    };
    if cache.update(3, renamed).await? {
        say!(cli, "Updated #3");
    }
    if cache.delete(1).await? {
        say!(cli, "Deleted #1");
    }

    for contact in cache.get_all().await? {
        say!(cli, "  #{} {} <{}>", contact.id, contact.name, contact.email);
    }
    Ok(())
}

async fn accounts(cli: &Cli, publisher: Arc<BroadcastPublisher>) -> anyhow::Result<()> {
    let accounts = Accounts::builder()
        .store(Arc::new(MemoryUserStore::new()))
        .publisher(publisher)
        .build()?;
    let registration = Registration {
        first_name: "Jane".into(),
        last_name:  "Roe".into(),
        email:      "jane@example.com".into(),
        password:   "correct horse battery staple".into(),
        role:       Role::User,
    };
    accounts
        .register(registration)
        .await?
        .context("registration was rejected")?;

    let granted = accounts
        .login("jane@example.com", "correct horse battery staple")
        .await?
        .is_some();
    let denied = accounts.login("jane@example.com", "Tr0ub4dor&3").await?.is_none();
    say!(cli, "Login with the right password: {granted}; wrong one rejected: {denied}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing()?;

    let publisher = Arc::new(BroadcastPublisher::default());
    let mut events = publisher.subscribe();
    let listener = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Ok(event) = events.recv().await {
            info!(event_type = event.event_type(), "event published");
            seen.push(event);
        }
        seen
    });

    #[cfg(feature = "redis")]
    if let Some(url) = cli.redis_url.as_deref() {
        let store = contact_cache::store::RedisStore::connect(url)?;
        contacts(&cli, Arc::new(store), publisher.clone()).await?;
    }
    else {
        contacts(&cli, Arc::new(MokaStore::default()), publisher.clone()).await?;
    }

    #[cfg(not(feature = "redis"))]
    contacts(&cli, Arc::new(MokaStore::default()), publisher.clone()).await?;

    accounts(&cli, publisher.clone()).await?;

    // Closing the last sender ends the listener loop.
    drop(publisher);
    let seen = listener.await?;
    say!(cli, "{} events published", seen.len());

    Ok(())
}
