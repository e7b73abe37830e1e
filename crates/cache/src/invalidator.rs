//! Redis cache invalidator.

use async_trait::async_trait;
use carmeet_common::{AppError, AppResult, Config};
use carmeet_core::services::{CacheInvalidator, CacheTag};
use fred::clients::Client as RedisClient;
use fred::interfaces::{ClientLike, KeysInterface, PubsubInterface};
use fred::types::config::Config as RedisConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Cache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

/// Payload published on the invalidation channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationMessage {
    /// View paths that became stale.
    pub tags: Vec<String>,
}

/// Invalidates cached views stored in Redis.
#[derive(Clone)]
pub struct RedisCacheInvalidator {
    redis: RedisClient,
    prefix: String,
    channel: String,
}

impl RedisCacheInvalidator {
    /// Create an invalidator over an existing client.
    #[must_use]
    pub fn new(redis: RedisClient, prefix: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
            channel: channel.into(),
        }
    }

    /// Connect to Redis using the application configuration.
    pub async fn connect(config: &Config) -> Result<Self, CacheError> {
        let redis_config =
            RedisConfig::from_url(&config.redis.url).map_err(|e| CacheError::Redis(e.to_string()))?;

        let client = RedisClient::new(redis_config, None, None, None);
        client
            .init()
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;

        info!(channel = %config.cache.channel, "Redis cache invalidator connected");

        Ok(Self::new(
            client,
            config.redis.prefix.clone(),
            config.cache.channel.clone(),
        ))
    }

    /// Redis key holding the cached view for `tag`.
    #[must_use]
    pub fn view_key(&self, tag: &CacheTag) -> String {
        format!("{}:view:{}", self.prefix, tag.path())
    }

    /// Build the Pub/Sub payload for `tags`.
    pub fn message(tags: &[CacheTag]) -> Result<String, CacheError> {
        let message = InvalidationMessage {
            tags: tags.iter().map(CacheTag::path).collect(),
        };
        serde_json::to_string(&message).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    async fn invalidate_tags(&self, tags: &[CacheTag]) -> Result<(), CacheError> {
        let keys: Vec<String> = tags.iter().map(|t| self.view_key(t)).collect();

        let deleted: i64 = self
            .redis
            .del(keys)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;

        let payload = Self::message(tags)?;
        let _: () = self
            .redis
            .publish(self.channel.as_str(), payload)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;

        debug!(deleted, tags = tags.len(), channel = %self.channel, "Invalidated cached views");
        Ok(())
    }
}

#[async_trait]
impl CacheInvalidator for RedisCacheInvalidator {
    async fn invalidate(&self, tags: &[CacheTag]) -> AppResult<()> {
        if tags.is_empty() {
            return Ok(());
        }
        self.invalidate_tags(tags).await.map_err(Into::into)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn invalidator() -> RedisCacheInvalidator {
        let client = RedisClient::new(RedisConfig::default(), None, None, None);
        RedisCacheInvalidator::new(client, "carmeet", "carmeet:invalidate")
    }

    #[tokio::test]
    async fn test_view_keys() {
        let invalidator = invalidator();

        assert_eq!(
            invalidator.view_key(&CacheTag::Car("car1".to_string())),
            "carmeet:view:/cars/car1"
        );
        assert_eq!(
            invalidator.view_key(&CacheTag::HomeFeed),
            "carmeet:view:/"
        );
    }

    #[test]
    fn test_message_lists_paths_in_order() {
        let payload = RedisCacheInvalidator::message(&[
            CacheTag::Event("ev1".to_string()),
            CacheTag::EventList,
        ])
        .unwrap();

        let message: InvalidationMessage = serde_json::from_str(&payload).unwrap();
        assert_eq!(message.tags, vec!["/events/ev1", "/events"]);
    }

    #[test]
    fn test_cache_error_maps_to_store_unavailable() {
        let err: AppError = CacheError::Redis("connection refused".to_string()).into();

        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_tag_set_skips_redis() {
        // The client is never connected, so any command would fail.
        let invalidator = invalidator();

        assert!(invalidator.invalidate(&[]).await.is_ok());
    }
}
