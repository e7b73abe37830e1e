//! Database-backed store implementations.

use async_trait::async_trait;
use carmeet_common::{AppError, AppResult};
use carmeet_db::{
    entities::{car_like, event_attendee, event_attendee::AttendeeStatus, following, user},
    repositories::{
        CarLikeRepository, CarRepository, EventAttendeeRepository, EventRepository,
        FollowingRepository, UserRepository,
    },
};
use chrono::Utc;
use sea_orm::Set;

use super::toggle::{CounterField, CounterStore, Relationship, RelationshipStore};

impl From<car_like::Model> for Relationship {
    fn from(model: car_like::Model) -> Self {
        Self {
            id: model.id,
            actor_id: model.user_id,
            target_id: model.car_id,
            status: None,
        }
    }
}

impl From<following::Model> for Relationship {
    fn from(model: following::Model) -> Self {
        Self {
            id: model.id,
            actor_id: model.follower_id,
            target_id: model.followee_id,
            status: None,
        }
    }
}

impl From<event_attendee::Model> for Relationship {
    fn from(model: event_attendee::Model) -> Self {
        Self {
            id: model.id,
            actor_id: model.user_id,
            target_id: model.event_id,
            status: Some(model.status),
        }
    }
}

fn into_relationships<M: Into<Relationship>>(models: Vec<M>) -> Vec<Relationship> {
    models.into_iter().map(Into::into).collect()
}

#[async_trait]
impl RelationshipStore for CarLikeRepository {
    async fn find(&self, actor_id: &str, target_id: &str) -> AppResult<Option<Relationship>> {
        Ok(self.find_by_pair(actor_id, target_id).await?.map(Into::into))
    }

    async fn insert(&self, relationship: Relationship) -> AppResult<bool> {
        self.insert_if_absent(car_like::ActiveModel {
            id: Set(relationship.id),
            user_id: Set(relationship.actor_id),
            car_id: Set(relationship.target_id),
            created_at: Set(Utc::now().into()),
        })
        .await
    }

    async fn delete(&self, actor_id: &str, target_id: &str) -> AppResult<bool> {
        self.delete_by_pair(actor_id, target_id).await
    }

    async fn count_for_target(&self, target_id: &str) -> AppResult<u64> {
        self.count_by_car(target_id).await
    }

    async fn count_for_actor(&self, actor_id: &str) -> AppResult<u64> {
        self.count_by_user(actor_id).await
    }

    async fn list_for_target(
        &self,
        target_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        Ok(into_relationships(
            self.find_by_car(target_id, limit, until_id).await?,
        ))
    }

    async fn list_for_actor(
        &self,
        actor_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        Ok(into_relationships(
            self.find_by_user(actor_id, limit, until_id).await?,
        ))
    }
}

#[async_trait]
impl RelationshipStore for FollowingRepository {
    async fn find(&self, actor_id: &str, target_id: &str) -> AppResult<Option<Relationship>> {
        Ok(self.find_by_pair(actor_id, target_id).await?.map(Into::into))
    }

    async fn insert(&self, relationship: Relationship) -> AppResult<bool> {
        self.insert_if_absent(following::ActiveModel {
            id: Set(relationship.id),
            follower_id: Set(relationship.actor_id),
            followee_id: Set(relationship.target_id),
            created_at: Set(Utc::now().into()),
        })
        .await
    }

    async fn delete(&self, actor_id: &str, target_id: &str) -> AppResult<bool> {
        self.delete_by_pair(actor_id, target_id).await
    }

    async fn count_for_target(&self, target_id: &str) -> AppResult<u64> {
        self.count_followers(target_id).await
    }

    async fn count_for_actor(&self, actor_id: &str) -> AppResult<u64> {
        self.count_following(actor_id).await
    }

    async fn list_for_target(
        &self,
        target_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        Ok(into_relationships(
            self.find_followers(target_id, limit, until_id).await?,
        ))
    }

    async fn list_for_actor(
        &self,
        actor_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        Ok(into_relationships(
            self.find_following(actor_id, limit, until_id).await?,
        ))
    }
}

#[async_trait]
impl RelationshipStore for EventAttendeeRepository {
    async fn find(&self, actor_id: &str, target_id: &str) -> AppResult<Option<Relationship>> {
        Ok(self.find_by_pair(actor_id, target_id).await?.map(Into::into))
    }

    async fn insert(&self, relationship: Relationship) -> AppResult<bool> {
        self.insert_if_absent(event_attendee::ActiveModel {
            id: Set(relationship.id),
            user_id: Set(relationship.actor_id),
            event_id: Set(relationship.target_id),
            status: Set(relationship.status.unwrap_or(AttendeeStatus::Going)),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        })
        .await
    }

    async fn delete(&self, actor_id: &str, target_id: &str) -> AppResult<bool> {
        self.delete_by_pair(actor_id, target_id).await
    }

    async fn update_status(
        &self,
        actor_id: &str,
        target_id: &str,
        status: AttendeeStatus,
    ) -> AppResult<bool> {
        EventAttendeeRepository::update_status(self, actor_id, target_id, status).await
    }

    async fn count_for_target(&self, target_id: &str) -> AppResult<u64> {
        self.count_by_event(target_id).await
    }

    async fn count_for_actor(&self, actor_id: &str) -> AppResult<u64> {
        self.count_by_user(actor_id).await
    }

    async fn list_for_target(
        &self,
        target_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        Ok(into_relationships(
            self.find_by_event(target_id, limit, until_id).await?,
        ))
    }

    async fn list_for_actor(
        &self,
        actor_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Relationship>> {
        Ok(into_relationships(
            self.find_by_user(actor_id, limit, until_id).await?,
        ))
    }
}

/// Counter store over the car, user and event tables.
#[derive(Clone)]
pub struct SeaOrmCounterStore {
    cars: CarRepository,
    users: UserRepository,
    events: EventRepository,
}

impl SeaOrmCounterStore {
    /// Create a new counter store.
    #[must_use]
    pub const fn new(cars: CarRepository, users: UserRepository, events: EventRepository) -> Self {
        Self {
            cars,
            users,
            events,
        }
    }
}

fn not_found(field: CounterField, entity_id: &str) -> AppError {
    AppError::NotFound(format!("{} {entity_id}", field.entity()))
}

fn to_column_value(value: i64) -> AppResult<i32> {
    i32::try_from(value).map_err(|_| AppError::InvalidArgument(format!("Counter value {value} out of range")))
}

#[async_trait]
impl CounterStore for SeaOrmCounterStore {
    async fn read(&self, field: CounterField, entity_id: &str) -> AppResult<Option<i64>> {
        let value = match field {
            CounterField::CarLikes => self
                .cars
                .find_by_id(entity_id)
                .await?
                .map(|c| c.total_likes),
            CounterField::UserFollowers => self
                .users
                .find_by_id(entity_id)
                .await?
                .map(|u| u.follower_count),
            CounterField::UserFollowing => self
                .users
                .find_by_id(entity_id)
                .await?
                .map(|u| u.following_count),
            CounterField::EventAttendees => self
                .events
                .find_by_id(entity_id)
                .await?
                .map(|e| e.attendee_count),
        };

        Ok(value.map(i64::from))
    }

    async fn adjust(&self, field: CounterField, entity_id: &str, delta: i64) -> AppResult<i64> {
        let delta = to_column_value(delta)?;
        // The value comes from the UPDATE's RETURNING row, not a second read.
        let value = match field {
            CounterField::CarLikes => self
                .cars
                .adjust_total_likes(entity_id, delta)
                .await?
                .map(|c| c.total_likes),
            CounterField::UserFollowers => self
                .users
                .adjust_count(entity_id, user::Column::FollowerCount, delta)
                .await?
                .map(|u| u.follower_count),
            CounterField::UserFollowing => self
                .users
                .adjust_count(entity_id, user::Column::FollowingCount, delta)
                .await?
                .map(|u| u.following_count),
            CounterField::EventAttendees => self
                .events
                .adjust_attendee_count(entity_id, delta)
                .await?
                .map(|e| e.attendee_count),
        };

        value
            .map(i64::from)
            .ok_or_else(|| not_found(field, entity_id))
    }

    async fn overwrite(&self, field: CounterField, entity_id: &str, value: i64) -> AppResult<()> {
        let value = to_column_value(value)?;
        let updated = match field {
            CounterField::CarLikes => self.cars.set_total_likes(entity_id, value).await?,
            CounterField::UserFollowers => {
                self.users
                    .set_count(entity_id, user::Column::FollowerCount, value)
                    .await?
            }
            CounterField::UserFollowing => {
                self.users
                    .set_count(entity_id, user::Column::FollowingCount, value)
                    .await?
            }
            CounterField::EventAttendees => {
                self.events.set_attendee_count(entity_id, value).await?
            }
        };

        if updated {
            Ok(())
        } else {
            Err(not_found(field, entity_id))
        }
    }
}
