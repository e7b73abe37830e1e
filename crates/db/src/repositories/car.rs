//! Car repository.

use std::sync::Arc;

use super::counter_delta_expr;
use crate::entities::{Car, car};
use carmeet_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr};

/// Car repository for database operations.
#[derive(Clone)]
pub struct CarRepository {
    db: Arc<DatabaseConnection>,
}

impl CarRepository {
    /// Create a new car repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a car by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<car::Model>> {
        Car::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Find a car by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<car::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Car {id}")))
    }

    /// Adjust the likes count atomically (single `UPDATE ... RETURNING`).
    ///
    /// Returns the updated car, or `None` if no car with this ID exists.
    pub async fn adjust_total_likes(&self, car_id: &str, delta: i32) -> AppResult<Option<car::Model>> {
        let updated = Car::update_many()
            .col_expr(
                car::Column::TotalLikes,
                counter_delta_expr(car::Column::TotalLikes, delta),
            )
            .filter(car::Column::Id.eq(car_id))
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(updated.into_iter().next())
    }

    /// Overwrite the likes count.
    pub async fn set_total_likes(&self, car_id: &str, value: i32) -> AppResult<bool> {
        let result = Car::update_many()
            .col_expr(car::Column::TotalLikes, Expr::value(value))
            .filter(car::Column::Id.eq(car_id))
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
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_car(id: &str, owner_id: &str, total_likes: i32) -> car::Model {
        car::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            make: "Mazda".to_string(),
            model: "MX-5".to_string(),
            year: Some(1991),
            nickname: None,
            total_likes,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<car::Model>::new()])
                .into_connection(),
        );

        let repo = CarRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_adjust_total_likes_returns_updated_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    vec![create_test_car("car1", "user1", 13)],
                    Vec::<car::Model>::new(),
                ])
                .into_connection(),
        );

        let repo = CarRepository::new(db);

        let updated = repo.adjust_total_likes("car1", 1).await.unwrap().unwrap();
        assert_eq!(updated.total_likes, 13);
        assert!(repo.adjust_total_likes("gone", -1).await.unwrap().is_none());
    }
}
