//! Assignment — the edge linking one client to one commercial.
//!
//! Edge identity is the `(client_id, user_id)` pair: at most one edge per
//! pair, active or not. Business flows deactivate edges (`active = false`)
//! and keep them for history; hard removal is a separate elevated operation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── AssignmentRole ──────────────────────────────────────────────────────────

/// The identity's position on one edge. `Primary` denotes the principal
/// responsible commercial; a client has at most one active primary edge.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentRole {
  Primary,
  Secondary,
}

impl AssignmentRole {
  pub fn is_primary(self) -> bool { matches!(self, Self::Primary) }
}

// ─── Assignment ──────────────────────────────────────────────────────────────

/// A persisted client↔user edge with its provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
  pub client_id:   Uuid,
  pub user_id:     Uuid,
  pub role:        AssignmentRole,
  /// Identity that created or last modified this edge.
  pub assigned_by: Uuid,
  /// Server-assigned timestamp of the creating or last-modifying write.
  pub assigned_at: DateTime<Utc>,
  pub active:      bool,
}

// ─── NewAssignment ───────────────────────────────────────────────────────────

/// Input to [`crate::store::ClientStore::attach_edge`].
/// `assigned_at` is always set by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignment {
  pub user_id:     Uuid,
  pub role:        AssignmentRole,
  pub assigned_by: Uuid,
  #[serde(default = "default_active")]
  pub active:      bool,
}

fn default_active() -> bool { true }

impl NewAssignment {
  /// Convenience constructor for an active edge.
  pub fn new(user_id: Uuid, role: AssignmentRole, assigned_by: Uuid) -> Self {
    Self { user_id, role, assigned_by, active: true }
  }
}

// ─── AssignmentSpec ──────────────────────────────────────────────────────────

/// One desired edge in a sync or merge call. Provenance (`assigned_by`,
/// `assigned_at`) is supplied per call, not per entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSpec {
  pub user_id: Uuid,
  pub role:    AssignmentRole,
  #[serde(default = "default_active")]
  pub active:  bool,
}

impl AssignmentSpec {
  pub fn new(user_id: Uuid, role: AssignmentRole) -> Self {
    Self { user_id, role, active: true }
  }

  pub fn inactive(user_id: Uuid, role: AssignmentRole) -> Self {
    Self { user_id, role, active: false }
  }
}

/// Validate a desired edge set before it replaces a client's assignments.
///
/// Rejects duplicate users, a set with no active edge, and a set with more
/// than one active primary. Used by stores ahead of sync-style writes so the
/// invariants hold before any row is touched.
pub fn validate_desired_set(
  client_id: Uuid,
  specs: &[AssignmentSpec],
) -> Result<()> {
  let mut seen = BTreeSet::new();
  for spec in specs {
    if !seen.insert(spec.user_id) {
      return Err(Error::DuplicateEdge { client_id, user_id: spec.user_id });
    }
  }

  if !specs.iter().any(|s| s.active) {
    return Err(Error::LastActiveAssignment(client_id));
  }

  let active_primaries = specs
    .iter()
    .filter(|s| s.active && s.role.is_primary())
    .count();
  if active_primaries > 1 {
    return Err(Error::DuplicatePrimary(client_id));
  }

  Ok(())
}
