//! Car like service.

use std::sync::Arc;

use carmeet_common::{AppResult, CounterMode};
use serde::Serialize;

use super::invalidation::{CacheTag, InvalidationDispatcher};
use super::toggle::{
    CounterField, CounterStore, Relationship, RelationshipKind, RelationshipStore,
    RelationshipToggle, Resolution, ToggleSpec,
};

/// Result of a like toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResult {
    pub is_liked: bool,
    pub like_count: i64,
    pub resolution: Resolution,
}

fn like_tags(actor_id: &str, car_id: &str) -> Vec<CacheTag> {
    vec![
        CacheTag::Car(car_id.to_string()),
        CacheTag::User(actor_id.to_string()),
        CacheTag::Leaderboard,
        CacheTag::HomeFeed,
    ]
}

/// Toggle spec for car likes.
#[must_use]
pub fn like_spec(likes: Arc<dyn RelationshipStore>) -> ToggleSpec {
    ToggleSpec {
        kind: RelationshipKind::Like,
        relationships: likes,
        target_counter: CounterField::CarLikes,
        actor_counter: None,
        self_reference_error: None,
        default_status: None,
        invalidation_tags: like_tags,
    }
}

/// Car like service for business logic.
#[derive(Clone)]
pub struct CarLikeService {
    toggle: RelationshipToggle,
}

impl CarLikeService {
    /// Create a new car like service.
    #[must_use]
    pub fn new(
        likes: Arc<dyn RelationshipStore>,
        counters: Arc<dyn CounterStore>,
        invalidation: InvalidationDispatcher,
        mode: CounterMode,
    ) -> Self {
        Self {
            toggle: RelationshipToggle::new(like_spec(likes), counters, invalidation, mode),
        }
    }

    fn likes(&self) -> &dyn RelationshipStore {
        self.toggle.spec().relationships.as_ref()
    }

    /// Like the car, or take the like back if it already exists.
    pub async fn toggle_like(&self, actor_id: Option<&str>, car_id: &str) -> AppResult<LikeResult> {
        let outcome = self.toggle.toggle(actor_id, car_id, None).await?;

        Ok(LikeResult {
            is_liked: outcome.is_active,
            like_count: outcome.counter,
            resolution: outcome.resolution,
        })
    }

    /// Check whether a user likes a car.
    pub async fn is_liked(&self, user_id: &str, car_id: &str) -> AppResult<bool> {
        Ok(self.likes().find(user_id, car_id).await?.is_some())
    }

    /// Users who liked a car, newest first.
    pub async fn likers(
        &self,
        car_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        self.likes().list_for_target(car_id, limit, until_id).await
    }

    /// Cars a user liked, newest first.
    pub async fn liked_cars(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        self.likes().list_for_actor(user_id, limit, until_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::invalidation::CacheInvalidator;
    use crate::services::memory::{MemoryCounterStore, MemoryRelationshipStore, RecordingInvalidator};
    use std::time::Duration;

    async fn setup(mode: CounterMode) -> (CarLikeService, Arc<MemoryRelationshipStore>) {
        let likes = Arc::new(MemoryRelationshipStore::new());
        let counters = Arc::new(MemoryCounterStore::new());
        counters.insert(CounterField::CarLikes, "car1", 5).await;
        counters.insert(CounterField::CarLikes, "car2", 0).await;

        let service = CarLikeService::new(
            likes.clone(),
            counters,
            InvalidationDispatcher::noop(),
            mode,
        );
        (service, likes)
    }

    #[tokio::test]
    async fn test_like_unlike_round_trip() {
        let (service, _) = setup(CounterMode::Atomic).await;

        let liked = service.toggle_like(Some("userA"), "car1").await.unwrap();
        assert_eq!(
            liked,
            LikeResult {
                is_liked: true,
                like_count: 6,
                resolution: Resolution::Applied,
            }
        );
        assert!(service.is_liked("userA", "car1").await.unwrap());

        let unliked = service.toggle_like(Some("userA"), "car1").await.unwrap();
        assert!(!unliked.is_liked);
        assert_eq!(unliked.like_count, 5);
        assert!(!service.is_liked("userA", "car1").await.unwrap());
    }

    #[tokio::test]
    async fn test_likers_and_liked_cars() {
        let (service, _) = setup(CounterMode::Atomic).await;
        service.toggle_like(Some("userA"), "car1").await.unwrap();
        service.toggle_like(Some("userB"), "car1").await.unwrap();
        service.toggle_like(Some("userA"), "car2").await.unwrap();

        let likers = service.likers("car1", 10, None).await.unwrap();
        let mut actors: Vec<_> = likers.iter().map(|r| r.actor_id.as_str()).collect();
        actors.sort_unstable();
        assert_eq!(actors, vec!["userA", "userB"]);

        let liked = service.liked_cars("userA", 1, None).await.unwrap();
        assert_eq!(liked.len(), 1);
    }

    #[tokio::test]
    async fn test_like_invalidates_car_actor_and_rankings() {
        let likes = Arc::new(MemoryRelationshipStore::new());
        let counters = Arc::new(MemoryCounterStore::new());
        counters.insert(CounterField::CarLikes, "car1", 0).await;
        let (invalidator, mut rx) = RecordingInvalidator::channel();
        let invalidator: Arc<dyn CacheInvalidator> = Arc::new(invalidator);

        let service = CarLikeService::new(
            likes,
            counters,
            InvalidationDispatcher::new(invalidator),
            CounterMode::Atomic,
        );
        service.toggle_like(Some("userA"), "car1").await.unwrap();

        let tags = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            tags,
            vec![
                CacheTag::Car("car1".to_string()),
                CacheTag::User("userA".to_string()),
                CacheTag::Leaderboard,
                CacheTag::HomeFeed,
            ]
        );
    }
}
