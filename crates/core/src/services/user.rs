//! User service and identity resolution.

use async_trait::async_trait;
use carmeet_common::{AppError, AppResult};
use carmeet_db::{entities::user, repositories::UserRepository};

/// Resolves an access token to the acting user.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// The actor id for `token`, or `None` if the token is unknown.
    async fn resolve(&self, token: &str) -> AppResult<Option<String>>;
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Get a user by ID.
    pub async fn get(&self, user_id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(user_id).await
    }

    /// Authenticate a user by token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthenticated)
    }
}

#[async_trait]
impl IdentityResolver for UserService {
    async fn resolve(&self, token: &str) -> AppResult<Option<String>> {
        Ok(self.user_repo.find_by_token(token).await?.map(|u| u.id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: "akina".to_string(),
            username_lower: "akina".to_string(),
            token: Some("test_token".to_string()),
            name: Some("Takumi".to_string()),
            follower_count: 0,
            following_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_authenticate_by_token_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("user1")]])
                .into_connection(),
        );
        let service = UserService::new(UserRepository::new(db));

        let user = service.authenticate_by_token("test_token").await.unwrap();

        assert_eq!(user.id, "user1");
    }

    #[tokio::test]
    async fn test_authenticate_by_token_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let service = UserService::new(UserRepository::new(db));

        let result = service.authenticate_by_token("invalid").await;

        assert!(matches!(result, Err(AppError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_resolve_unknown_token_is_anonymous() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let service = UserService::new(UserRepository::new(db));

        assert_eq!(service.resolve("invalid").await.unwrap(), None);
    }
}
