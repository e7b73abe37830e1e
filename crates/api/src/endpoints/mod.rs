//! API endpoints.

mod cars;
mod counters;
mod events;
mod following;

use axum::Router;

use crate::middleware::AppState;

/// Default page size for listing endpoints.
pub(crate) const fn default_limit() -> u64 {
    30
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/cars", cars::router())
        .nest("/following", following::router())
        .nest("/events", events::router())
        .nest("/counters", counters::router())
}
