//! Handlers for `/clients/:id/assignments` endpoints.
//!
//! All mutations require the manage-assignments capability (full-access
//! tier); agents and base managers never mutate edges directly. The acting
//! identity from the request headers becomes `assigned_by` on every write.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/clients/:id/assignments` | `?include_inactive=true` for history |
//! | `POST` | `/clients/:id/assignments` | Strict attach; 409 on existing pair |
//! | `POST` | `/clients/:id/assignments/sync` | Total replacement |
//! | `POST` | `/clients/:id/assignments/merge` | Upsert, never detaches |
//! | `POST` | `/clients/:id/assignments/promote` | Single active primary after |
//! | `POST` | `/clients/:id/assignments/:user/role` | In-place role change |
//! | `POST` | `/clients/:id/assignments/:user/deactivate` | Soft removal |
//! | `POST` | `/clients/:id/assignments/:user/detach` | Hard removal |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use ambit_core::{
  assignment::{Assignment, AssignmentRole, AssignmentSpec, NewAssignment},
  policy::{self, AccessFacts, ClientAction},
  store::ClientStore,
};

use crate::{access_facts, error::ApiError, identity::ActorIdentity};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// If `true`, also return deactivated edges. Default `false`.
  #[serde(default)]
  pub include_inactive: bool,
}

/// `GET /clients/:id/assignments[?include_inactive=true]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Assignment>>, ApiError>
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

  let edges = store
    .edges_for_client(id, params.include_inactive)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(edges))
}

// ─── Attach ───────────────────────────────────────────────────────────────────

/// `POST /clients/:id/assignments` — body: [`AssignmentSpec`].
/// Strict create; returns 201 + the stored edge.
pub async fn attach<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
  Json(spec): Json<AssignmentSpec>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClientStore,
{
  policy::authorize(
    &actor,
    ClientAction::ManageAssignments,
    AccessFacts::default(),
  )?;

  let edge = store
    .attach_edge(id, NewAssignment {
      user_id:     spec.user_id,
      role:        spec.role,
      assigned_by: actor.actor_id,
      active:      spec.active,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(edge)))
}

// ─── Sync / merge ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SyncBody {
  pub assignments: Vec<AssignmentSpec>,
}

/// `POST /clients/:id/assignments/sync` — replace the whole edge set.
pub async fn sync<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
  Json(body): Json<SyncBody>,
) -> Result<Json<Vec<Assignment>>, ApiError>
where
  S: ClientStore,
{
  policy::authorize(
    &actor,
    ClientAction::ManageAssignments,
    AccessFacts::default(),
  )?;

  let edges = store
    .sync_assignments(id, body.assignments, actor.actor_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(edges))
}

/// `POST /clients/:id/assignments/merge` — upsert without detaching.
pub async fn merge<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
  Json(body): Json<SyncBody>,
) -> Result<Json<Vec<Assignment>>, ApiError>
where
  S: ClientStore,
{
  policy::authorize(
    &actor,
    ClientAction::ManageAssignments,
    AccessFacts::default(),
  )?;

  let edges = store
    .merge_assignments(id, body.assignments, actor.actor_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(edges))
}

// ─── Promote ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PromoteBody {
  pub user_id: Uuid,
}

/// `POST /clients/:id/assignments/promote` — body: `{"user_id":"..."}`.
pub async fn promote<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
  Json(body): Json<PromoteBody>,
) -> Result<Json<Assignment>, ApiError>
where
  S: ClientStore,
{
  policy::authorize(
    &actor,
    ClientAction::ManageAssignments,
    AccessFacts::default(),
  )?;

  let edge = store
    .promote_to_primary(id, body.user_id, actor.actor_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(edge))
}

// ─── Per-edge operations ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RoleBody {
  pub role: AssignmentRole,
}

/// `POST /clients/:id/assignments/:user/role` — body: `{"role":"secondary"}`.
pub async fn update_role<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path((id, user_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<RoleBody>,
) -> Result<Json<Assignment>, ApiError>
where
  S: ClientStore,
{
  policy::authorize(
    &actor,
    ClientAction::ManageAssignments,
    AccessFacts::default(),
  )?;

  let edge = store
    .update_edge_role(id, user_id, body.role)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(edge))
}

/// `POST /clients/:id/assignments/:user/deactivate` — soft removal.
pub async fn deactivate<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Assignment>, ApiError>
where
  S: ClientStore,
{
  policy::authorize(
    &actor,
    ClientAction::ManageAssignments,
    AccessFacts::default(),
  )?;

  let edge = store
    .deactivate_edge(id, user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(edge))
}

/// `POST /clients/:id/assignments/:user/detach` — hard removal.
pub async fn detach<S>(
  State(store): State<Arc<S>>,
  ActorIdentity(actor): ActorIdentity,
  Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClientStore,
{
  policy::authorize(
    &actor,
    ClientAction::ManageAssignments,
    AccessFacts::default(),
  )?;

  store
    .detach_edge(id, user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
