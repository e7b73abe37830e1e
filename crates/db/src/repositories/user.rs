//! User repository.

use std::sync::Arc;

use super::counter_delta_expr;
use crate::entities::{User, user};
use carmeet_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {id}")))
    }

    /// Find a user by token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Adjust one of the denormalized counters atomically (single `UPDATE ... RETURNING`).
    ///
    /// Returns the updated user, or `None` if no user with this ID exists.
    pub async fn adjust_count(
        &self,
        user_id: &str,
        column: user::Column,
        delta: i32,
    ) -> AppResult<Option<user::Model>> {
        let updated = User::update_many()
            .col_expr(column, counter_delta_expr(column, delta))
            .filter(user::Column::Id.eq(user_id))
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(updated.into_iter().next())
    }

    /// Overwrite one of the denormalized counters.
    pub async fn set_count(
        &self,
        user_id: &str,
        column: user::Column,
        value: i32,
    ) -> AppResult<bool> {
        let result = User::update_many()
            .col_expr(column, Expr::value(value))
            .filter(user::Column::Id.eq(user_id))
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_user(id: &str, token: Option<&str>) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("driver_{id}"),
            username_lower: format!("driver_{id}"),
            token: token.map(str::to_string),
            name: None,
            follower_count: 3,
            following_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_token_found() {
        let user = create_test_user("user1", Some("secret"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_token("secret").await.unwrap();

        assert_eq!(found.unwrap().id, "user1");
    }

    #[tokio::test]
    async fn test_adjust_count_returns_updated_row() {
        let mut user = create_test_user("user1", None);
        user.follower_count = 4;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let updated = repo
            .adjust_count("user1", user::Column::FollowerCount, 1)
            .await
            .unwrap();

        assert_eq!(updated.map(|u| u.follower_count), Some(4));
    }

    #[tokio::test]
    async fn test_set_count_reports_missing_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(db);

        assert!(!repo
            .set_count("gone", user::Column::FollowingCount, 2)
            .await
            .unwrap());
    }
}
