use moka::future::{Cache, CacheBuilder};
use redis::aio::ConnectionManager;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

type SharedRedis = Arc<Mutex<ConnectionManager>>;

/// Two-tier JSON cache
///
/// Tier one is an in-process moka cache local to each replica. Tier two is
/// an optional Redis instance shared by all replicas; without it every
/// operation is served by tier one alone. Both tiers expire entries after
/// the same TTL.
pub struct CacheManager {
    local: Cache<String, Arc<str>>,
    shared: Option<SharedRedis>,
    ttl: Duration,
    /// Bumped by every `delete`, before any tier is touched
    invalidations: AtomicU64,
}

impl CacheManager {
    /// Connect to Redis and build the local tier in front of it
    pub async fn new(redis_url: &str, local_capacity: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        let mut cache = Self::in_memory(local_capacity, ttl_secs);
        cache.shared = Some(Arc::new(Mutex::new(connection)));
        Ok(cache)
    }

    pub fn in_memory(local_capacity: u64, ttl_secs: u64) -> Self {
        let ttl = Duration::from_secs(ttl_secs);
        Self {
            local: CacheBuilder::new(local_capacity).time_to_live(ttl).build(),
            shared: None,
            ttl,
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn has_redis(&self) -> bool {
        self.shared.is_some()
    }

    /// Look a key up, local tier first
    ///
    /// A Redis hit is copied into the local tier. `Ok(None)` is a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        if let Some(json) = self.local.get(key).await {
            tracing::trace!("Local cache hit: {}", key);
            return Ok(Some(serde_json::from_str(&json)?));
        }

        let Some(json) = self.shared_get(key).await? else {
            tracing::trace!("Cache miss: {}", key);
            return Ok(None);
        };

        tracing::trace!("Redis cache hit: {}", key);
        let value = serde_json::from_str(&json)?;
        self.local.insert(key.to_string(), Arc::from(json)).await;
        Ok(Some(value))
    }

    /// Store a value in every tier
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;

        if let Some(redis) = &self.shared {
            let mut conn = redis.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl.as_secs())
                .arg(&json)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        self.local.insert(key.to_string(), Arc::from(json)).await;
        tracing::trace!("Cached {}", key);
        Ok(())
    }

    /// Current invalidation epoch, taken before loading a value from its source
    pub fn invalidation_epoch(&self) -> u64 {
        self.invalidations.load(Ordering::Acquire)
    }

    /// Store a value loaded while `epoch` was current
    ///
    /// Skips the write when a `delete` ran since `epoch` was taken, and
    /// withdraws it when one lands during the write, so a value loaded before
    /// a source update never outlives that update's invalidation in this
    /// process. Returns whether the value stayed cached.
    pub async fn set_unless_invalidated<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        epoch: u64,
    ) -> Result<bool, CacheError> {
        if self.invalidation_epoch() != epoch {
            tracing::debug!("Skipping stale cache write: {}", key);
            return Ok(false);
        }

        self.set(key, value).await?;

        if self.invalidation_epoch() != epoch {
            tracing::debug!("Withdrawing stale cache write: {}", key);
            self.delete(key).await?;
            return Ok(false);
        }

        Ok(true)
    }

    /// Drop a key from every tier
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.invalidations.fetch_add(1, Ordering::AcqRel);
        self.local.invalidate(key).await;

        if let Some(redis) = &self.shared {
            let mut conn = redis.lock().await;
            redis::cmd("DEL")
                .arg(key)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::debug!("Cache invalidated: {}", key);
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            local_entries: self.local.entry_count(),
            redis_enabled: self.has_redis(),
            ttl_secs: self.ttl.as_secs(),
        }
    }

    async fn shared_get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let Some(redis) = &self.shared else {
            return Ok(None);
        };

        let mut conn = redis.lock().await;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut *conn).await?;
        Ok(value)
    }
}

/// Point-in-time view of the cache, reported by the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    #[serde(rename = "localEntries")]
    pub local_entries: u64,
    #[serde(rename = "redisEnabled")]
    pub redis_enabled: bool,
    #[serde(rename = "ttlSecs")]
    pub ttl_secs: u64,
}

pub struct CacheKey;

impl CacheKey {
    /// Every caretaker, as read by the recommendation endpoint
    pub fn caretaker_directory() -> String {
        "caretakers:directory".to_string()
    }
}
