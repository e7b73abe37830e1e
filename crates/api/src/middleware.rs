//! API middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use carmeet_core::{
    CarLikeService, CounterMaintenanceService, EventAttendanceService, FollowingService,
    IdentityResolver,
};
use tracing::{debug, warn};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityResolver>,
    pub car_like_service: CarLikeService,
    pub following_service: FollowingService,
    pub event_attendance_service: EventAttendanceService,
    pub counter_maintenance_service: CounterMaintenanceService,
}

/// The acting user, inserted into request extensions by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

fn bearer_token(req: &Request<Body>) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
}

/// Authentication middleware.
///
/// A missing or unknown token leaves the request anonymous; handlers decide
/// whether that is acceptable.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&req) {
        match state.identity.resolve(&token).await {
            Ok(Some(actor_id)) => {
                req.extensions_mut().insert(Actor(actor_id));
            }
            Ok(None) => debug!("Unknown access token, continuing anonymously"),
            Err(e) => warn!(error = %e, "Failed to resolve access token"),
        }
    }

    next.run(req).await
}
