//! Following service.

use std::sync::Arc;

use carmeet_common::{AppResult, CounterMode};
use serde::Serialize;

use super::invalidation::{CacheTag, InvalidationDispatcher};
use super::toggle::{
    CounterField, CounterStore, Relationship, RelationshipKind, RelationshipStore,
    RelationshipToggle, Resolution, ToggleSpec,
};

/// Result of a follow toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResult {
    pub is_following: bool,
    /// Followers of the target user.
    pub follower_count: i64,
    /// Users the acting user follows.
    pub following_count: i64,
    pub resolution: Resolution,
}

fn follow_tags(actor_id: &str, followee_id: &str) -> Vec<CacheTag> {
    vec![
        CacheTag::User(followee_id.to_string()),
        CacheTag::User(actor_id.to_string()),
    ]
}

/// Toggle spec for follows.
#[must_use]
pub fn follow_spec(follows: Arc<dyn RelationshipStore>) -> ToggleSpec {
    ToggleSpec {
        kind: RelationshipKind::Follow,
        relationships: follows,
        target_counter: CounterField::UserFollowers,
        actor_counter: Some(CounterField::UserFollowing),
        self_reference_error: Some("Cannot follow yourself"),
        default_status: None,
        invalidation_tags: follow_tags,
    }
}

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    toggle: RelationshipToggle,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub fn new(
        follows: Arc<dyn RelationshipStore>,
        counters: Arc<dyn CounterStore>,
        invalidation: InvalidationDispatcher,
        mode: CounterMode,
    ) -> Self {
        Self {
            toggle: RelationshipToggle::new(follow_spec(follows), counters, invalidation, mode),
        }
    }

    fn follows(&self) -> &dyn RelationshipStore {
        self.toggle.spec().relationships.as_ref()
    }

    /// Follow the user, or unfollow if already following.
    ///
    /// Updates the followee's follower count and the follower's following count.
    pub async fn toggle_follow(
        &self,
        actor_id: Option<&str>,
        followee_id: &str,
    ) -> AppResult<FollowResult> {
        let outcome = self.toggle.toggle(actor_id, followee_id, None).await?;

        Ok(FollowResult {
            is_following: outcome.is_active,
            follower_count: outcome.counter,
            following_count: outcome.actor_counter.unwrap_or_default(),
            resolution: outcome.resolution,
        })
    }

    /// Check if a user is following another user.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        Ok(self.follows().find(follower_id, followee_id).await?.is_some())
    }

    /// Get followers of a user.
    pub async fn followers(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        self.follows().list_for_target(user_id, limit, until_id).await
    }

    /// Get users that a user is following.
    pub async fn following(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        self.follows().list_for_actor(user_id, limit, until_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::memory::{MemoryCounterStore, MemoryRelationshipStore};
    use carmeet_common::AppError;

    async fn setup() -> (FollowingService, Arc<MemoryRelationshipStore>) {
        let follows = Arc::new(MemoryRelationshipStore::new());
        let counters = Arc::new(MemoryCounterStore::new());
        for user in ["userA", "userB", "userC"] {
            counters.insert(CounterField::UserFollowers, user, 0).await;
            counters.insert(CounterField::UserFollowing, user, 0).await;
        }
        counters.insert(CounterField::UserFollowers, "userB", 3).await;

        let service = FollowingService::new(
            follows.clone(),
            counters,
            InvalidationDispatcher::noop(),
            CounterMode::Atomic,
        );
        (service, follows)
    }

    #[tokio::test]
    async fn test_follow_and_unfollow_update_both_sides() {
        let (service, _) = setup().await;

        let followed = service.toggle_follow(Some("userA"), "userB").await.unwrap();
        assert_eq!(
            followed,
            FollowResult {
                is_following: true,
                follower_count: 4,
                following_count: 1,
                resolution: Resolution::Applied,
            }
        );

        let unfollowed = service.toggle_follow(Some("userA"), "userB").await.unwrap();
        assert!(!unfollowed.is_following);
        assert_eq!(unfollowed.follower_count, 3);
        assert_eq!(unfollowed.following_count, 0);
    }

    #[tokio::test]
    async fn test_follow_yourself_returns_error() {
        let (service, follows) = setup().await;

        let result = service.toggle_follow(Some("userA"), "userA").await;

        assert!(matches!(result, Err(AppError::InvalidOperation(_))));
        assert!(follows.is_empty().await);
    }

    #[tokio::test]
    async fn test_follow_unknown_user_is_not_found() {
        let (service, follows) = setup().await;

        let result = service.toggle_follow(Some("userA"), "ghost").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(follows.write_count(), 0);
    }

    #[tokio::test]
    async fn test_followers_and_following_lists() {
        let (service, _) = setup().await;
        service.toggle_follow(Some("userA"), "userB").await.unwrap();
        service.toggle_follow(Some("userC"), "userB").await.unwrap();
        service.toggle_follow(Some("userA"), "userC").await.unwrap();

        assert_eq!(service.followers("userB", 10, None).await.unwrap().len(), 2);
        assert_eq!(service.following("userA", 10, None).await.unwrap().len(), 2);
        assert!(service.is_following("userC", "userB").await.unwrap());
        assert!(!service.is_following("userB", "userC").await.unwrap());
    }
}
