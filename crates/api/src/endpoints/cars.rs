//! Car endpoints.

use axum::{Router, extract::State, routing::post};
use carmeet_common::AppResult;
use carmeet_core::LikeResult;
use serde::Deserialize;
use validator::Validate;

use super::default_limit;
use crate::{
    extractors::{AuthActor, ValidatedJson},
    middleware::AppState,
    response::{ApiResponse, Items, RelationshipResponse, relationships},
};

/// Toggle like request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeRequest {
    pub car_id: String,
}

/// Likers listing request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LikesRequest {
    pub car_id: String,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u64,
    pub until_id: Option<String>,
}

/// Like a car, or remove the like.
async fn toggle_like(
    AuthActor(actor): AuthActor,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ToggleLikeRequest>,
) -> AppResult<ApiResponse<LikeResult>> {
    let result = state
        .car_like_service
        .toggle_like(Some(actor.as_str()), &req.car_id)
        .await?;
    Ok(ApiResponse::ok(result))
}

/// Users who liked a car.
async fn likes(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LikesRequest>,
) -> AppResult<ApiResponse<Items<RelationshipResponse>>> {
    let rows = state
        .car_like_service
        .likers(&req.car_id, req.limit, req.until_id.as_deref())
        .await?;
    Ok(relationships(rows))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/like/toggle", post(toggle_like))
        .route("/likes", post(likes))
}
