//! Identity extractors

use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use privateer_domain::Usersign;

use crate::error::PrivateerError;

/// Handler guard: the caller must be an authenticated user.
///
/// Rejects with `AuthenticationRequired` before the handler body runs.
#[derive(Debug, Clone)]
pub struct RequireUser(pub Usersign);

#[async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = PrivateerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Usersign>() {
            Some(usersign) if !usersign.is_guest() => Ok(RequireUser(usersign.clone())),
            _ => Err(PrivateerError::AuthenticationRequired),
        }
    }
}

/// The request's identity, GUEST when none was attached
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Usersign);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(
            parts.extensions.get::<Usersign>().cloned().unwrap_or_default(),
        ))
    }
}
