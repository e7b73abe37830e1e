//! API response types.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use carmeet_core::Relationship;
use carmeet_db::entities::event_attendee::AttendeeStatus;
use serde::Serialize;

/// Successful API response.
///
/// The payload's fields are flattened next to `success`; failures are
/// rendered by `AppError` as `{ success: false, error }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// A page of items.
#[derive(Debug, Serialize)]
pub struct Items<T: Serialize> {
    pub items: Vec<T>,
}

/// A relationship row as returned by listing endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipResponse {
    pub id: String,
    pub user_id: String,
    pub target_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendeeStatus>,
}

impl From<Relationship> for RelationshipResponse {
    fn from(r: Relationship) -> Self {
        Self {
            id: r.id,
            user_id: r.actor_id,
            target_id: r.target_id,
            status: r.status,
        }
    }
}

/// Wrap relationship rows into a listing response.
pub fn relationships(rows: Vec<Relationship>) -> ApiResponse<Items<RelationshipResponse>> {
    ApiResponse::ok(Items {
        items: rows.into_iter().map(Into::into).collect(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Payload {
        is_liked: bool,
    }

    #[test]
    fn test_payload_is_flattened() {
        let json = serde_json::to_value(ApiResponse::ok(Payload { is_liked: true })).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "isLiked": true }));
    }
}
