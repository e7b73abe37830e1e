//! Following repository.

use std::sync::Arc;

use crate::entities::{Following, following};
use carmeet_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::OnConflict,
};

/// Following repository for database operations.
#[derive(Clone)]
pub struct FollowingRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowingRepository {
    /// Create a new following repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a following relationship by follower and followee.
    pub async fn find_by_pair(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<following::Model>> {
        Following::find()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Create a following relationship unless the pair already exists.
    ///
    /// Returns `true` if a row was written.
    pub async fn insert_if_absent(&self, model: following::ActiveModel) -> AppResult<bool> {
        let rows = Following::insert(model)
            .on_conflict(
                OnConflict::columns([
                    following::Column::FollowerId,
                    following::Column::FolloweeId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(rows > 0)
    }

    /// Delete a following relationship by pair.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete_by_pair(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        let result = Following::delete_many()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Get users that a user is following (paginated).
    pub async fn find_following(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<following::Model>> {
        let mut query = Following::find()
            .filter(following::Column::FollowerId.eq(user_id))
            .order_by_desc(following::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(following::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Get users that are following a user (paginated).
    pub async fn find_followers(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<following::Model>> {
        let mut query = Following::find()
            .filter(following::Column::FolloweeId.eq(user_id))
            .order_by_desc(following::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(following::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Count followers of a user.
    pub async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FolloweeId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Count following of a user.
    pub async fn count_following(&self, user_id: &str) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FollowerId.eq(user_id))
            .count(self.db.as_ref())
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

    fn create_test_following(id: &str, follower_id: &str, followee_id: &str) -> following::Model {
        following::Model {
            id: id.to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_found() {
        let following = create_test_following("f1", "user1", "user2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[following.clone()]])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let result = repo.find_by_pair("user1", "user2").await.unwrap();

        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_find_by_pair_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<following::Model>::new()])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let result = repo.find_by_pair("user1", "user3").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_by_pair_removes_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);

        assert!(repo.delete_by_pair("user1", "user2").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_following() {
        let f1 = create_test_following("f1", "user1", "user2");
        let f2 = create_test_following("f2", "user1", "user3");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[f1, f2]])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let result = repo.find_following("user1", 10, None).await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_count_followers() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(4))
                }]])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);

        assert_eq!(repo.count_followers("user2").await.unwrap(), 4);
    }
}
