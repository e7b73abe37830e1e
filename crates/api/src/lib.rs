//! HTTP API layer for carmeet.
//!
//! - **Endpoints**: toggle and listing routes for likes, follows and attendance
//! - **Extractors**: acting user, validated JSON bodies
//! - **Middleware**: bearer token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
