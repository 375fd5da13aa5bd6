//! Actor extraction from trusted identity headers.
//!
//! Authentication happens in the fronting identity layer, which forwards the
//! caller's identity and role facts as `x-actor-id` and `x-actor-roles`.
//! The extractor normalises role codes into the canonical taxonomy; every
//! handler receives the acting identity explicitly — nothing downstream
//! reads ambient identity state.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use ambit_core::actor::{Actor, RoleSet};

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLES_HEADER: &str = "x-actor-roles";

/// The acting identity, parsed from trusted request headers.
pub struct ActorIdentity(pub Actor);

impl<S> FromRequestParts<S> for ActorIdentity
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let id = parts
      .headers
      .get(ACTOR_ID_HEADER)
      .and_then(|v| v.to_str().ok())
      .ok_or_else(|| {
        ApiError::Unauthorized(format!("missing {ACTOR_ID_HEADER} header"))
      })?;

    let actor_id = Uuid::parse_str(id).map_err(|_| {
      ApiError::BadRequest(format!("{ACTOR_ID_HEADER} is not a UUID"))
    })?;

    // A caller with no roles header is a valid identity with no grants.
    let roles_raw = parts
      .headers
      .get(ACTOR_ROLES_HEADER)
      .and_then(|v| v.to_str().ok())
      .unwrap_or("");

    let codes = roles_raw
      .split(',')
      .map(str::trim)
      .filter(|code| !code.is_empty());
    let roles = RoleSet::from_codes(codes)
      .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Self(Actor::new(actor_id, roles)))
  }
}
