//! Counter maintenance endpoints.
//!
//! Reconciliation is idempotent and only rewrites counters from row counts,
//! so any authenticated user may trigger it.

use axum::{Router, extract::State, routing::post};
use carmeet_common::AppResult;
use carmeet_core::{ReconcileReport, RelationshipKind};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::{
    extractors::{AuthActor, ValidatedJson},
    middleware::AppState,
    response::ApiResponse,
};

/// Counter reconciliation request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    pub kind: RelationshipKind,
    pub target_id: String,
}

/// Recount relationship rows and overwrite the stored counters.
async fn reconcile_counters(
    AuthActor(actor): AuthActor,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ReconcileRequest>,
) -> AppResult<ApiResponse<ReconcileReport>> {
    info!(actor_id = %actor, kind = %req.kind, target_id = %req.target_id, "Counter reconciliation requested");
    let report = state
        .counter_maintenance_service
        .reconcile(req.kind, &req.target_id)
        .await?;
    Ok(ApiResponse::ok(report))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/reconcile", post(reconcile_counters))
}
