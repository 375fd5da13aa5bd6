//! The `ClientStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `ambit-store-sqlite`).
//! Higher layers (`ambit-api`) depend on this abstraction, not on any
//! concrete backend.
//!
//! The write half is the assignment manager: every mutation takes the acting
//! identity explicitly so provenance is recorded, and every multi-row change
//! (create-with-auto-assign, sync, merge, promote, purge) must be atomic in
//! the backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  actor::Actor,
  assignment::{Assignment, AssignmentRole, AssignmentSpec, NewAssignment},
  client::{Client, ClientKind, ClientPatch, NewClient, Potential},
  scope::VisibilityScope,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Orthogonal filters for [`ClientStore::list_clients`]. Every set field
/// narrows the result; all compose with the visibility scope by logical AND.
#[derive(Debug, Clone, Default)]
pub struct ClientQuery {
  /// Free-text filter over code, name and contact fields.
  pub text:            Option<String>,
  pub kind:            Option<ClientKind>,
  pub city:            Option<String>,
  pub zone_id:         Option<Uuid>,
  pub base_id:         Option<Uuid>,
  /// Only clients with an active edge to this user.
  pub assigned_to:     Option<Uuid>,
  pub potential:       Option<Potential>,
  pub updated_after:   Option<DateTime<Utc>>,
  /// Include retired (`active = false`) clients. Default: active only.
  pub include_retired: bool,
  pub limit:           Option<usize>,
  pub offset:          Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an Ambit client/assignment store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ClientStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Clients ───────────────────────────────────────────────────────────

  /// Create and persist a new client.
  ///
  /// When `actor` holds the agent role, one active primary edge
  /// `(client, actor)` with `assigned_by = actor` is created in the same
  /// atomic write — the creating agent becomes the responsible commercial
  /// without an explicit attach.
  fn create_client(
    &self,
    input: NewClient,
    actor: Actor,
  ) -> impl Future<Output = Result<Client, Self::Error>> + Send + '_;

  /// Retrieve a client by id. Returns `None` if not found.
  fn get_client(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Client>, Self::Error>> + Send + '_;

  /// Apply a partial update; bumps `updated_at`.
  fn update_client(
    &self,
    id: Uuid,
    patch: ClientPatch,
  ) -> impl Future<Output = Result<Client, Self::Error>> + Send + '_;

  /// Soft delete: clears the client's `active` flag, keeping the row and
  /// its edges for history.
  fn retire_client(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Client, Self::Error>> + Send + '_;

  /// Undo [`retire_client`](Self::retire_client).
  fn restore_client(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Client, Self::Error>> + Send + '_;

  /// Irreversible hard delete of the client and all its edges.
  fn purge_client(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// List clients visible under `scope`, narrowed by `query`.
  fn list_clients<'a>(
    &'a self,
    scope: &'a VisibilityScope,
    query: &'a ClientQuery,
  ) -> impl Future<Output = Result<Vec<Client>, Self::Error>> + Send + 'a;

  // ── Assignment edges — writes ─────────────────────────────────────────

  /// Strict create: fails with a duplicate-edge error if any edge for the
  /// pair exists, active or not. Callers wanting idempotency use
  /// [`sync_assignments`](Self::sync_assignments) or
  /// [`merge_assignments`](Self::merge_assignments).
  fn attach_edge(
    &self,
    client_id: Uuid,
    input: NewAssignment,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  /// Total replacement: after the call the client's edge set is exactly
  /// `specs`. Edges absent from the set are hard-deleted, present ones
  /// created or updated. Idempotent; atomic; rejects a set with no active
  /// edge or more than one active primary.
  fn sync_assignments(
    &self,
    client_id: Uuid,
    specs: Vec<AssignmentSpec>,
    assigned_by: Uuid,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  /// Sync without detaching: upserts `specs`, never removes an unmentioned
  /// edge. The post-call edge set is the union by user id, with `specs`
  /// winning on conflicting fields.
  fn merge_assignments(
    &self,
    client_id: Uuid,
    specs: Vec<AssignmentSpec>,
    assigned_by: Uuid,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  /// In-place role change on an existing edge.
  fn update_edge_role(
    &self,
    client_id: Uuid,
    user_id: Uuid,
    role: AssignmentRole,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  /// Soft removal: clears the edge's `active` flag; the row stays
  /// queryable for history. Rejected if it would leave the client with
  /// zero active edges.
  fn deactivate_edge(
    &self,
    client_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  /// Hard removal of one edge, history included. Elevated callers only;
  /// same last-active-edge rejection as
  /// [`deactivate_edge`](Self::deactivate_edge).
  fn detach_edge(
    &self,
    client_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Make `(client_id, user_id)` the single active primary edge: demote
  /// every active primary to secondary, then update the pair's edge to
  /// active primary, creating it if absent. One atomic write.
  fn promote_to_primary(
    &self,
    client_id: Uuid,
    user_id: Uuid,
    assigned_by: Uuid,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  // ── Assignment edges — reads ──────────────────────────────────────────

  /// All edges for a client. `include_inactive = false` filters on the
  /// active flag.
  fn edges_for_client(
    &self,
    client_id: Uuid,
    include_inactive: bool,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  /// All edges for a user, across clients.
  fn edges_for_user(
    &self,
    user_id: Uuid,
    include_inactive: bool,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  /// Whether an active edge exists for the pair. Feeds
  /// [`AccessFacts`](crate::policy::AccessFacts).
  fn active_edge_exists(
    &self,
    client_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Base management membership ────────────────────────────────────────

  /// The bases managed by `user_id`. Feeds the visibility scoper and
  /// [`AccessFacts`](crate::policy::AccessFacts).
  fn managed_bases(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  /// Replace the managed-base set for `user_id`. The membership data is
  /// owned by the identity subsystem; this is its sync/seed entry point.
  fn set_managed_bases(
    &self,
    user_id: Uuid,
    base_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
