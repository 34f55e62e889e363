use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_TTL_SECS: u64 = 300;

/// Environment variable consulted by [`CacheConfig::from_env()`].
pub const TTL_ENV: &str = "CONTACT_CACHE_TTL";

/// Immutable cache configuration, read once when a [`CacheAside`](crate::CacheAside) is built.
///
/// Bad input never fails startup: an absent, unparsable or zero TTL falls back to [`DEFAULT_TTL_SECS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs", deserialize_with = "lenient_ttl")]
    ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

// Accepts a number or a numeric string; anything else is replaced by the default.
fn lenient_ttl<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::Number(n) => CacheConfig::checked_ttl(n.as_u64(), &n.to_string()),
        serde_json::Value::String(s) => CacheConfig::from_raw(Some(&s)).ttl_secs,
        other => CacheConfig::checked_ttl(None, &other.to_string()),
    })
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl CacheConfig {
    /// Sub-second TTLs are rounded up to one second. Only [`Duration::ZERO`] falls back to the default.
    pub fn new(ttl: Duration) -> Self {
        let secs = ttl.as_secs().max(u64::from(!ttl.is_zero()));
        Self {
            ttl_secs: Self::checked_ttl(Some(secs), &format!("{ttl:?}")),
        }
    }

    /// Parse a TTL given in seconds as text, e.g. from a settings file.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(raw) = raw
        else {
            return Self::default();
        };
        Self {
            ttl_secs: Self::checked_ttl(raw.trim().parse::<u64>().ok(), raw),
        }
    }

    pub fn from_env() -> Self {
        Self::from_raw(std::env::var(TTL_ENV).ok().as_deref())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    fn checked_ttl(parsed: Option<u64>, raw: &str) -> u64 {
        match parsed {
            Some(secs) if secs > 0 => secs,
            _ => {
                warn!("Invalid cache TTL '{raw}', falling back to {DEFAULT_TTL_SECS}s");
                DEFAULT_TTL_SECS
            }
        }
    }
}
