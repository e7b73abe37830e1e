//! Cache invalidation signals.
//!
//! Invalidation is best-effort: the dispatcher spawns the work on the runtime
//! and never reports its outcome to the caller. The concrete invalidator lives
//! in the cache crate (Redis), so core services only see the trait.

use async_trait::async_trait;
use carmeet_common::AppResult;
use std::fmt;
use std::sync::Arc;

/// A cached view that depends on a counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheTag {
    /// A car's detail page.
    Car(String),
    /// A user's profile (followers, garage, likes).
    User(String),
    /// An event's detail page.
    Event(String),
    /// The most-liked cars ranking.
    Leaderboard,
    /// The upcoming events list.
    EventList,
    /// The home feed.
    HomeFeed,
}

impl CacheTag {
    /// The view path this tag stands for.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Car(id) => format!("/cars/{id}"),
            Self::User(id) => format!("/users/{id}"),
            Self::Event(id) => format!("/events/{id}"),
            Self::Leaderboard => "/leaderboard".to_string(),
            Self::EventList => "/events".to_string(),
            Self::HomeFeed => "/".to_string(),
        }
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Marks cached views as stale.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Invalidate every view named by `tags`.
    async fn invalidate(&self, tags: &[CacheTag]) -> AppResult<()>;
}

/// Type alias for a shared invalidator.
pub type CacheInvalidatorService = Arc<dyn CacheInvalidator>;

/// Invalidator used when caching is disabled.
#[derive(Debug, Clone, Default)]
pub struct NoOpInvalidator;

#[async_trait]
impl CacheInvalidator for NoOpInvalidator {
    async fn invalidate(&self, _tags: &[CacheTag]) -> AppResult<()> {
        Ok(())
    }
}

/// Fire-and-forget front for a [`CacheInvalidator`].
#[derive(Clone)]
pub struct InvalidationDispatcher {
    invalidator: CacheInvalidatorService,
}

impl InvalidationDispatcher {
    /// Create a dispatcher for the given invalidator.
    #[must_use]
    pub fn new(invalidator: CacheInvalidatorService) -> Self {
        Self { invalidator }
    }

    /// Create a dispatcher that drops every signal.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Arc::new(NoOpInvalidator))
    }

    /// Spawn the invalidation of `tags` without waiting for it.
    ///
    /// Failures are logged and swallowed.
    pub fn dispatch(&self, tags: Vec<CacheTag>) {
        if tags.is_empty() {
            return;
        }

        let invalidator = self.invalidator.clone();
        tokio::spawn(async move {
            if let Err(e) = invalidator.invalidate(&tags).await {
                tracing::warn!(error = %e, tags = ?tags, "Failed to invalidate cached views");
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::memory::{FailingInvalidator, RecordingInvalidator};
    use std::time::Duration;

    #[test]
    fn test_tag_paths() {
        assert_eq!(CacheTag::Car("c1".to_string()).path(), "/cars/c1");
        assert_eq!(CacheTag::User("u1".to_string()).path(), "/users/u1");
        assert_eq!(CacheTag::Event("e1".to_string()).to_string(), "/events/e1");
        assert_eq!(CacheTag::Leaderboard.path(), "/leaderboard");
        assert_eq!(CacheTag::EventList.path(), "/events");
        assert_eq!(CacheTag::HomeFeed.path(), "/");
    }

    #[tokio::test]
    async fn test_dispatch_delivers_tags() {
        let (invalidator, mut rx) = RecordingInvalidator::channel();
        let dispatcher = InvalidationDispatcher::new(Arc::new(invalidator));

        dispatcher.dispatch(vec![CacheTag::Leaderboard]);

        let tags = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tags, vec![CacheTag::Leaderboard]);
    }

    #[tokio::test]
    async fn test_dispatch_skips_empty_tag_set() {
        let (invalidator, mut rx) = RecordingInvalidator::channel();
        let dispatcher = InvalidationDispatcher::new(Arc::new(invalidator));

        dispatcher.dispatch(Vec::new());

        let received = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(received.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let invalidator = Arc::new(FailingInvalidator::default());
        let dispatcher = InvalidationDispatcher::new(invalidator.clone());

        dispatcher.dispatch(vec![CacheTag::HomeFeed]);

        for _ in 0..100 {
            if invalidator.attempts() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(invalidator.attempts(), 1);
    }
}
