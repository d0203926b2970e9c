//! Aggregate-stats cache — pluggable, trait-based.
//!
//! Default: `RedisStatsCache` when REDIS_URL is configured.
//! Fallback: `NoopStatsCache` (caching disabled).
//!
//! `AppState` holds an `Arc<dyn StatsCache>`, selected at startup via config.
//! Cache failures are logged and swallowed: a dead Redis must never fail a
//! read request.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::warn;

#[async_trait]
pub trait StatsCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, value: &str);
}

/// Cache key for a job title's aggregate payload.
pub fn title_stats_key(slug: &str) -> String {
    format!("stats:title:{slug}")
}

pub struct RedisStatsCache {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisStatsCache {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }
}

#[async_trait]
impl StatsCache for RedisStatsCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut con = match self.client.get_multiplexed_async_connection().await {
            Ok(con) => con,
            Err(e) => {
                warn!("Redis connection failed, skipping cache read: {e}");
                return None;
            }
        };
        match con.get::<_, Option<String>>(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Redis GET {key} failed: {e}");
                None
            }
        }
    }

    async fn put(&self, key: &str, value: &str) {
        let mut con = match self.client.get_multiplexed_async_connection().await {
            Ok(con) => con,
            Err(e) => {
                warn!("Redis connection failed, skipping cache write: {e}");
                return;
            }
        };
        if let Err(e) = con.set_ex::<_, _, ()>(key, value, self.ttl_secs).await {
            warn!("Redis SETEX {key} failed: {e}");
        }
    }
}

/// No-op backend used when caching is disabled.
pub struct NoopStatsCache;

#[async_trait]
impl StatsCache for NoopStatsCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn put(&self, _key: &str, _value: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_stats_key_shape() {
        assert_eq!(title_stats_key("software-engineer"), "stats:title:software-engineer");
    }

    #[tokio::test]
    async fn test_noop_cache_returns_nothing() {
        let cache = NoopStatsCache;
        cache.put("k", "v").await;
        assert_eq!(cache.get("k").await, None);
    }
}
