//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users/:id/clients` | The user's portfolio of assigned clients |
//! | `POST` | `/users/:id/bases` | Replace the user's managed-base membership |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use ambit_core::{client::Client, scope::VisibilityScope, store::ClientStore};

use crate::{clients::ListParams, error::ApiError, identity::ActorIdentity};

// ─── Portfolio ────────────────────────────────────────────────────────────────

/// `GET /users/:id/clients` — clients with an active edge to the user.
///
/// An actor may read its own portfolio; reading someone else's requires a
/// full-access role.
pub async fn clients<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path(user_id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Client>>, ApiError>
where
  S: ClientStore,
{
  if actor.actor_id != user_id && !actor.roles.has_full_access() {
    return Err(ApiError::Forbidden(
      "cannot view another user's portfolio".into(),
    ));
  }

  let clients = store
    .list_clients(&VisibilityScope::Assigned(user_id), &params.into())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(clients))
}

// ─── Base membership ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BasesBody {
  pub base_ids: Vec<Uuid>,
}

/// `POST /users/:id/bases` — body: `{"base_ids":[...]}`.
///
/// Sync entry point for the identity subsystem that owns the membership
/// data; full-access roles only.
pub async fn set_bases<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path(user_id): Path<Uuid>,
  Json(body): Json<BasesBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClientStore,
{
  if !actor.roles.has_full_access() {
    return Err(ApiError::Forbidden(
      "managing base membership requires a full-access role".into(),
    ));
  }

  store
    .set_managed_bases(user_id, body.base_ids)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
