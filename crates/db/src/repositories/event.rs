//! Event repository.

use std::sync::Arc;

use super::counter_delta_expr;
use crate::entities::{Event, event};
use carmeet_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr};

/// Event repository for database operations.
#[derive(Clone)]
pub struct EventRepository {
    db: Arc<DatabaseConnection>,
}

impl EventRepository {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<event::Model>> {
        Event::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Find an event by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<event::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {id}")))
    }

    /// Adjust the attendee count atomically (single `UPDATE ... RETURNING`).
    pub async fn adjust_attendee_count(
        &self,
        event_id: &str,
        delta: i32,
    ) -> AppResult<Option<event::Model>> {
        let updated = Event::update_many()
            .col_expr(
                event::Column::AttendeeCount,
                counter_delta_expr(event::Column::AttendeeCount, delta),
            )
            .filter(event::Column::Id.eq(event_id))
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(updated.into_iter().next())
    }

    /// Overwrite the attendee count.
    pub async fn set_attendee_count(&self, event_id: &str, value: i32) -> AppResult<bool> {
        let result = Event::update_many()
            .col_expr(event::Column::AttendeeCount, Expr::value(value))
            .filter(event::Column::Id.eq(event_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_event(id: &str, attendee_count: i32) -> event::Model {
        event::Model {
            id: id.to_string(),
            host_id: "host1".to_string(),
            title: "Sunday cruise".to_string(),
            location: Some("Harbour car park".to_string()),
            starts_at: (Utc::now() + Duration::days(3)).into(),
            attendee_count,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let event = create_test_event("ev1", 7);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[event]])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        let found = repo.find_by_id("ev1").await.unwrap().unwrap();

        assert_eq!(found.attendee_count, 7);
    }

    #[tokio::test]
    async fn test_set_attendee_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = EventRepository::new(db);

        assert!(repo.set_attendee_count("ev1", 3).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_error_maps_to_store_unavailable() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([sea_orm::DbErr::Custom("connection refused".to_string())])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        let result = repo.adjust_attendee_count("ev1", 1).await;

        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
    }
}
