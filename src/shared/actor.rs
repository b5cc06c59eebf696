use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use uuid::Uuid;

/// Optional acting-user id, read from the `x-actor-id` header.
///
/// Authentication and session handling live in front of this service; by the
/// time a request reaches these handlers the caller identity, when present,
/// arrives as a plain UUID header. Unparseable or absent values resolve to
/// `None` rather than rejecting the request.
pub struct ActorId(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get("x-actor-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok());
        Ok(ActorId(actor))
    }
}
