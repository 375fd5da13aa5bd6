//! JSON REST API for Ambit.
//!
//! Exposes an axum [`Router`] backed by any [`ambit_core::store::ClientStore`].
//! Authentication and TLS are the fronting identity layer's responsibility;
//! it forwards the caller's identity and role facts as trusted headers (see
//! [`identity`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", ambit_api::api_router(store.clone()))
//! ```

pub mod assignments;
pub mod clients;
pub mod error;
pub mod identity;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};

use ambit_core::{
  actor::{Actor, Role},
  client::Client,
  policy::AccessFacts,
  scope::VisibilityScope,
  store::ClientStore,
};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ClientStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Clients
    .route("/clients", get(clients::list::<S>).post(clients::create::<S>))
    .route("/clients/{id}", get(clients::get_one::<S>))
    .route("/clients/{id}/update", post(clients::update::<S>))
    .route("/clients/{id}/retire", post(clients::retire::<S>))
    .route("/clients/{id}/restore", post(clients::restore::<S>))
    .route("/clients/{id}/purge", post(clients::purge::<S>))
    // Assignments
    .route(
      "/clients/{id}/assignments",
      get(assignments::list::<S>).post(assignments::attach::<S>),
    )
    .route("/clients/{id}/assignments/sync", post(assignments::sync::<S>))
    .route("/clients/{id}/assignments/merge", post(assignments::merge::<S>))
    .route(
      "/clients/{id}/assignments/promote",
      post(assignments::promote::<S>),
    )
    .route(
      "/clients/{id}/assignments/{user}/role",
      post(assignments::update_role::<S>),
    )
    .route(
      "/clients/{id}/assignments/{user}/deactivate",
      post(assignments::deactivate::<S>),
    )
    .route(
      "/clients/{id}/assignments/{user}/detach",
      post(assignments::detach::<S>),
    )
    // Users
    .route("/users/{id}/clients", get(users::clients::<S>))
    .route("/users/{id}/bases", post(users::set_bases::<S>))
    .with_state(store)
}

// ─── Policy inputs ───────────────────────────────────────────────────────────

/// Derive the actor's visibility scope, looking up base membership only when
/// the base-manager grant could apply.
pub(crate) async fn scope_for<S>(
  store: &S,
  actor: &Actor,
) -> Result<VisibilityScope, ApiError>
where
  S: ClientStore,
{
  let bases = if actor.roles.contains(Role::BaseManager)
    && !actor.roles.has_full_access()
  {
    store
      .managed_bases(actor.actor_id)
      .await
      .map_err(ApiError::from_store)?
  } else {
    Vec::new()
  };
  Ok(VisibilityScope::for_actor(actor, &bases))
}

/// Gather the per-client facts a policy decision needs, querying only what
/// the actor's roles make relevant.
pub(crate) async fn access_facts<S>(
  store: &S,
  actor: &Actor,
  client: &Client,
) -> Result<AccessFacts, ApiError>
where
  S: ClientStore,
{
  let manages_base = if actor.roles.contains(Role::BaseManager) {
    store
      .managed_bases(actor.actor_id)
      .await
      .map_err(ApiError::from_store)?
      .contains(&client.base_id)
  } else {
    false
  };

  let has_active_edge = if actor.roles.contains(Role::Agent) {
    store
      .active_edge_exists(client.client_id, actor.actor_id)
      .await
      .map_err(ApiError::from_store)?
  } else {
    false
  };

  Ok(AccessFacts { manages_base, has_active_edge })
}

// ─── Integration tests ────────────────────────────────────────────────────────
