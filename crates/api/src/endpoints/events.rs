//! Event endpoints.

use axum::{Router, extract::State, routing::post};
use carmeet_common::AppResult;
use carmeet_core::{AttendanceChoice, AttendanceResult};
use serde::Deserialize;
use validator::Validate;

use super::default_limit;
use crate::{
    extractors::{AuthActor, ValidatedJson},
    middleware::AppState,
    response::{ApiResponse, Items, RelationshipResponse, relationships},
};

/// Toggle attendance request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToggleAttendanceRequest {
    pub event_id: String,
    /// `interested`, `going` or `remove`. Omitted means toggle.
    pub status: Option<AttendanceChoice>,
}

/// Attendees listing request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttendeesRequest {
    pub event_id: String,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u64,
    pub until_id: Option<String>,
}

async fn toggle_attendance(
    AuthActor(actor): AuthActor,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ToggleAttendanceRequest>,
) -> AppResult<ApiResponse<AttendanceResult>> {
    let result = state
        .event_attendance_service
        .toggle_attendance(Some(actor.as_str()), &req.event_id, req.status)
        .await?;
    Ok(ApiResponse::ok(result))
}

async fn attendees(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AttendeesRequest>,
) -> AppResult<ApiResponse<Items<RelationshipResponse>>> {
    let rows = state
        .event_attendance_service
        .attendees_of(&req.event_id, req.limit, req.until_id.as_deref())
        .await?;
    Ok(relationships(rows))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/attendance/toggle", post(toggle_attendance))
        .route("/attendees", post(attendees))
}
