//! Following endpoints.

use axum::{Router, extract::State, routing::post};
use carmeet_common::AppResult;
use carmeet_core::FollowResult;
use serde::Deserialize;
use validator::Validate;

use super::default_limit;
use crate::{
    extractors::{AuthActor, ValidatedJson},
    middleware::AppState,
    response::{ApiResponse, Items, RelationshipResponse, relationships},
};

/// Toggle follow request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFollowRequest {
    pub user_id: String,
}

/// Followers/following listing request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    pub user_id: String,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u64,
    pub until_id: Option<String>,
}

/// Follow a user, or unfollow them.
async fn toggle_follow(
    AuthActor(actor): AuthActor,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ToggleFollowRequest>,
) -> AppResult<ApiResponse<FollowResult>> {
    let result = state
        .following_service
        .toggle_follow(Some(actor.as_str()), &req.user_id)
        .await?;
    Ok(ApiResponse::ok(result))
}

/// Users following a user.
async fn followers(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ListRequest>,
) -> AppResult<ApiResponse<Items<RelationshipResponse>>> {
    let rows = state
        .following_service
        .followers(&req.user_id, req.limit, req.until_id.as_deref())
        .await?;
    Ok(relationships(rows))
}

/// Users a user follows.
async fn following(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ListRequest>,
) -> AppResult<ApiResponse<Items<RelationshipResponse>>> {
    let rows = state
        .following_service
        .following(&req.user_id, req.limit, req.until_id.as_deref())
        .await?;
    Ok(relationships(rows))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toggle", post(toggle_follow))
        .route("/followers", post(followers))
        .route("/following", post(following))
}
