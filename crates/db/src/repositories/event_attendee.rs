//! Event attendee repository.

use std::sync::Arc;

use crate::entities::{
    EventAttendee,
    event_attendee::{self, AttendeeStatus},
};
use carmeet_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::OnConflict,
};

/// Event attendee repository for database operations.
#[derive(Clone)]
pub struct EventAttendeeRepository {
    db: Arc<DatabaseConnection>,
}

impl EventAttendeeRepository {
    /// Create a new event attendee repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an attendance row by user and event.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> AppResult<Option<event_attendee::Model>> {
        EventAttendee::find()
            .filter(event_attendee::Column::UserId.eq(user_id))
            .filter(event_attendee::Column::EventId.eq(event_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Insert an attendance row unless the (user, event) pair already exists.
    ///
    /// Returns `true` if a row was written.
    pub async fn insert_if_absent(&self, model: event_attendee::ActiveModel) -> AppResult<bool> {
        let rows = EventAttendee::insert(model)
            .on_conflict(
                OnConflict::columns([
                    event_attendee::Column::UserId,
                    event_attendee::Column::EventId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(rows > 0)
    }

    /// Overwrite the status of an existing row in place (the row ID is kept).
    ///
    /// Returns `false` if the row no longer exists.
    pub async fn update_status(
        &self,
        user_id: &str,
        event_id: &str,
        status: AttendeeStatus,
    ) -> AppResult<bool> {
        let result = EventAttendee::update_many()
            .set(event_attendee::ActiveModel {
                status: Set(status),
                updated_at: Set(Some(chrono::Utc::now().into())),
                ..Default::default()
            })
            .filter(event_attendee::Column::UserId.eq(user_id))
            .filter(event_attendee::Column::EventId.eq(event_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Delete an attendance row by pair.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete_by_pair(&self, user_id: &str, event_id: &str) -> AppResult<bool> {
        let result = EventAttendee::delete_many()
            .filter(event_attendee::Column::UserId.eq(user_id))
            .filter(event_attendee::Column::EventId.eq(event_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Count attendance rows of an event (any status).
    pub async fn count_by_event(&self, event_id: &str) -> AppResult<u64> {
        EventAttendee::find()
            .filter(event_attendee::Column::EventId.eq(event_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Count events a user is attending or interested in.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        EventAttendee::find()
            .filter(event_attendee::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Get attendees of an event (paginated).
    pub async fn find_by_event(
        &self,
        event_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<event_attendee::Model>> {
        let mut query = EventAttendee::find()
            .filter(event_attendee::Column::EventId.eq(event_id))
            .order_by_desc(event_attendee::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(event_attendee::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Get events a user is attending or interested in (paginated).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<event_attendee::Model>> {
        let mut query = EventAttendee::find()
            .filter(event_attendee::Column::UserId.eq(user_id))
            .order_by_desc(event_attendee::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(event_attendee::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_attendee(id: &str, user_id: &str, status: AttendeeStatus) -> event_attendee::Model {
        event_attendee::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            event_id: "ev1".to_string(),
            status,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_keeps_status() {
        let row = create_test_attendee("a1", "user1", AttendeeStatus::Interested);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[row]])
                .into_connection(),
        );

        let repo = EventAttendeeRepository::new(db);
        let found = repo.find_by_pair("user1", "ev1").await.unwrap().unwrap();

        assert_eq!(found.status, AttendeeStatus::Interested);
    }

    #[tokio::test]
    async fn test_update_status_missing_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = EventAttendeeRepository::new(db);
        let updated = repo
            .update_status("user1", "ev1", AttendeeStatus::Going)
            .await
            .unwrap();

        assert!(!updated);
    }

    #[tokio::test]
    async fn test_find_by_event() {
        let a1 = create_test_attendee("a2", "user2", AttendeeStatus::Going);
        let a2 = create_test_attendee("a1", "user1", AttendeeStatus::Interested);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[a1, a2]])
                .into_connection(),
        );

        let repo = EventAttendeeRepository::new(db);
        let result = repo
            .find_by_event("ev1", 10, None)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "a2");
        assert_eq!(result[1].status, AttendeeStatus::Interested);
    }
}
