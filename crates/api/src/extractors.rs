//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use carmeet_common::AppError;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::middleware::Actor;

/// Authenticated acting user.
///
/// Rejects before any body extractor runs, so an anonymous call is
/// `UNAUTHENTICATED` even when its body is malformed.
#[derive(Debug, Clone)]
pub struct AuthActor(pub String);

impl<S> FromRequestParts<S> for AuthActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .map(|a| Self(a.0.clone()))
            .ok_or(AppError::Unauthenticated)
    }
}

/// JSON body that has passed `validator` checks.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidArgument(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}
