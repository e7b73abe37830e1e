//! Car like repository.

use std::sync::Arc;

use crate::entities::{CarLike, car_like};
use carmeet_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::OnConflict,
};

/// Car like repository for database operations.
#[derive(Clone)]
pub struct CarLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl CarLikeRepository {
    /// Create a new car like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a like by user and car.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        car_id: &str,
    ) -> AppResult<Option<car_like::Model>> {
        CarLike::find()
            .filter(car_like::Column::UserId.eq(user_id))
            .filter(car_like::Column::CarId.eq(car_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Insert a like unless the (user, car) pair already exists.
    ///
    /// Returns `true` if a row was written.
    pub async fn insert_if_absent(&self, model: car_like::ActiveModel) -> AppResult<bool> {
        let rows = CarLike::insert(model)
            .on_conflict(
                OnConflict::columns([car_like::Column::UserId, car_like::Column::CarId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(rows > 0)
    }

    /// Delete a like by pair.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete_by_pair(&self, user_id: &str, car_id: &str) -> AppResult<bool> {
        let result = CarLike::delete_many()
            .filter(car_like::Column::UserId.eq(user_id))
            .filter(car_like::Column::CarId.eq(car_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Count likes of a car.
    pub async fn count_by_car(&self, car_id: &str) -> AppResult<u64> {
        CarLike::find()
            .filter(car_like::Column::CarId.eq(car_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Count likes given by a user.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        CarLike::find()
            .filter(car_like::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Get likes of a car (paginated).
    pub async fn find_by_car(
        &self,
        car_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<car_like::Model>> {
        let mut query = CarLike::find()
            .filter(car_like::Column::CarId.eq(car_id))
            .order_by_desc(car_like::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(car_like::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Get likes given by a user (paginated).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<car_like::Model>> {
        let mut query = CarLike::find()
            .filter(car_like::Column::UserId.eq(user_id))
            .order_by_desc(car_like::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(car_like::Column::Id.lt(id));
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_like(id: &str, user_id: &str, car_id: &str) -> car_like::Model {
        car_like::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            car_id: car_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn new_like(user_id: &str, car_id: &str) -> car_like::ActiveModel {
        car_like::ActiveModel {
            id: Set("like1".to_string()),
            user_id: Set(user_id.to_string()),
            car_id: Set(car_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_found() {
        let like = create_test_like("l1", "user1", "car1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like]])
                .into_connection(),
        );

        let repo = CarLikeRepository::new(db);
        let result = repo.find_by_pair("user1", "car1").await.unwrap();

        assert_eq!(result.unwrap().id, "l1");
    }

    #[tokio::test]
    async fn test_insert_if_absent_reports_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = CarLikeRepository::new(db);

        assert!(repo.insert_if_absent(new_like("user1", "car1")).await.unwrap());
        assert!(!repo.insert_if_absent(new_like("user1", "car1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_pair_missing_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = CarLikeRepository::new(db);

        assert!(!repo.delete_by_pair("user1", "car1").await.unwrap());
    }

    #[tokio::test]
    async fn test_count_by_car() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(6))
                }]])
                .into_connection(),
        );

        let repo = CarLikeRepository::new(db);

        assert_eq!(repo.count_by_car("car1").await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_find_by_car() {
        let l1 = create_test_like("l2", "user2", "car1");
        let l2 = create_test_like("l1", "user1", "car1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[l1, l2]])
                .into_connection(),
        );

        let repo = CarLikeRepository::new(db);
        let result = repo.find_by_car("car1", 10, None).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].user_id, "user2");
    }
}
