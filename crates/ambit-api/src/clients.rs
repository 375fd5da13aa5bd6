//! Handlers for `/clients` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/clients` | Visible set for the actor; all filters optional |
//! | `POST` | `/clients` | Body: [`NewClient`]; agents auto-assign themselves |
//! | `GET`  | `/clients/:id` | 403 unless the actor may view this client |
//! | `POST` | `/clients/:id/update` | Body: [`ClientPatch`] |
//! | `POST` | `/clients/:id/retire` | Soft delete |
//! | `POST` | `/clients/:id/restore` | |
//! | `POST` | `/clients/:id/purge` | Irreversible; admin tier only |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use ambit_core::{
  client::{Client, ClientKind, ClientPatch, NewClient, Potential},
  policy::{self, AccessFacts, ClientAction},
  store::{ClientQuery, ClientStore},
};

use crate::{access_facts, error::ApiError, identity::ActorIdentity, scope_for};

// ─── List ─────────────────────────────────────────────────────────────────────

/// Query params for `GET /clients`; maps onto [`ClientQuery`].
#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub text:            Option<String>,
  pub kind:            Option<ClientKind>,
  pub city:            Option<String>,
  pub zone_id:         Option<Uuid>,
  pub base_id:         Option<Uuid>,
  pub assigned_to:     Option<Uuid>,
  pub potential:       Option<Potential>,
  pub updated_after:   Option<DateTime<Utc>>,
  #[serde(default)]
  pub include_retired: bool,
  pub limit:           Option<usize>,
  pub offset:          Option<usize>,
}

impl From<ListParams> for ClientQuery {
  fn from(p: ListParams) -> Self {
    ClientQuery {
      text:            p.text,
      kind:            p.kind,
      city:            p.city,
      zone_id:         p.zone_id,
      base_id:         p.base_id,
      assigned_to:     p.assigned_to,
      potential:       p.potential,
      updated_after:   p.updated_after,
      include_retired: p.include_retired,
      limit:           p.limit,
      offset:          p.offset,
    }
  }
}

/// `GET /clients` — the actor's visible clients, filtered and paginated.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Client>>, ApiError>
where
  S: ClientStore,
{
  policy::authorize(&actor, ClientAction::ViewAny, AccessFacts::default())?;

  let scope = scope_for(store.as_ref(), &actor).await?;
  let clients = store
    .list_clients(&scope, &params.into())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(clients))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /clients` — returns 201 + the stored [`Client`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Json(body): Json<NewClient>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClientStore,
{
  policy::authorize(&actor, ClientAction::Create, AccessFacts::default())?;

  let client = store
    .create_client(body, actor)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(client)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /clients/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
) -> Result<Json<Client>, ApiError>
where
  S: ClientStore,
{
  let client = store
    .get_client(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("client {id} not found")))?;

  let facts = access_facts(store.as_ref(), &actor, &client).await?;
  policy::authorize(&actor, ClientAction::View, facts)?;

  Ok(Json(client))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `POST /clients/:id/update` — body: [`ClientPatch`].
pub async fn update<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
  Json(patch): Json<ClientPatch>,
) -> Result<Json<Client>, ApiError>
where
  S: ClientStore,
{
  let client = store
    .get_client(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("client {id} not found")))?;

  let facts = access_facts(store.as_ref(), &actor, &client).await?;
  policy::authorize(&actor, ClientAction::Update, facts)?;

  let updated = store
    .update_client(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(updated))
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

/// `POST /clients/:id/retire` — soft delete.
pub async fn retire<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
) -> Result<Json<Client>, ApiError>
where
  S: ClientStore,
{
  policy::authorize(&actor, ClientAction::Retire, AccessFacts::default())?;

  let client = store
    .retire_client(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(client))
}

/// `POST /clients/:id/restore`
pub async fn restore<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
) -> Result<Json<Client>, ApiError>
where
  S: ClientStore,
{
  policy::authorize(&actor, ClientAction::Restore, AccessFacts::default())?;

  let client = store
    .restore_client(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(client))
}

/// `POST /clients/:id/purge` — irreversible hard delete.
pub async fn purge<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClientStore,
{
  policy::authorize(&actor, ClientAction::Purge, AccessFacts::default())?;

  store.purge_client(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
