//! Access policy — per-action authorization decisions.
//!
//! Decisions are pure functions over role facts plus two per-client facts
//! gathered by the caller. Roles map to a static capability table evaluated
//! once per decision; no decision site compares role strings.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  actor::{Actor, Role, RoleSet},
};

// ─── Actions ─────────────────────────────────────────────────────────────────

/// Everything the policy can be asked about.
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
pub enum ClientAction {
  /// List clients. Always permitted; the visibility scope filters the
  /// result set downstream.
  ViewAny,
  View,
  Create,
  Update,
  /// Soft delete — flips the client's `active` flag.
  Retire,
  Restore,
  /// Irreversible hard delete.
  Purge,
  /// Attach, detach, sync, role changes and promotion on assignment edges.
  ManageAssignments,
}

// ─── Capabilities ────────────────────────────────────────────────────────────

/// A single grant in the role→capability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
  ViewAll,
  ViewManagedBases,
  ViewAssigned,
  CreateClient,
  UpdateAll,
  UpdateAssigned,
  RetireClient,
  RestoreClient,
  PurgeClient,
  ManageAssignments,
}

impl Role {
  /// The static capability set granted by this role.
  ///
  /// Base managers can see the clients of their bases but not edit them;
  /// that asymmetry is deliberate and mirrored in [`permitted`].
  pub fn capabilities(self) -> &'static [Capability] {
    use Capability as C;
    match self {
      Role::Agent => {
        &[C::ViewAssigned, C::UpdateAssigned, C::CreateClient]
      }
      Role::BaseManager => &[C::ViewManagedBases],
      Role::CommercialAdmin | Role::Direction => &[
        C::ViewAll,
        C::CreateClient,
        C::UpdateAll,
        C::RetireClient,
        C::RestoreClient,
        C::ManageAssignments,
      ],
      Role::Admin | Role::SuperAdmin => &[
        C::ViewAll,
        C::CreateClient,
        C::UpdateAll,
        C::RetireClient,
        C::RestoreClient,
        C::PurgeClient,
        C::ManageAssignments,
      ],
    }
  }
}

impl RoleSet {
  /// Whether any held role grants `capability`.
  pub fn grants(&self, capability: Capability) -> bool {
    self
      .iter()
      .any(|role| role.capabilities().contains(&capability))
  }
}

// ─── Facts ───────────────────────────────────────────────────────────────────

/// Per-client facts a decision may depend on. Gathered by the caller from
/// the store; [`AccessFacts::default`] (both false) is correct for actions
/// that only consult static role grants.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessFacts {
  /// The actor manages the client's home base.
  pub manages_base:    bool,
  /// An active assignment edge exists between the actor and the client.
  pub has_active_edge: bool,
}

// ─── Decisions ───────────────────────────────────────────────────────────────

/// Pure decision function: may `actor` perform `action`?
pub fn permitted(
  actor: &Actor,
  action: ClientAction,
  facts: AccessFacts,
) -> bool {
  use Capability as C;
  let roles = &actor.roles;
  match action {
    ClientAction::ViewAny => true,
    ClientAction::View => {
      roles.grants(C::ViewAll)
        || (roles.grants(C::ViewManagedBases) && facts.manages_base)
        || (roles.grants(C::ViewAssigned) && facts.has_active_edge)
    }
    ClientAction::Create => roles.grants(C::CreateClient),
    // Base managers may view but not edit: no managed-base grant here.
    ClientAction::Update => {
      roles.grants(C::UpdateAll)
        || (roles.grants(C::UpdateAssigned) && facts.has_active_edge)
    }
    ClientAction::Retire => roles.grants(C::RetireClient),
    ClientAction::Restore => roles.grants(C::RestoreClient),
    ClientAction::Purge => roles.grants(C::PurgeClient),
    ClientAction::ManageAssignments => roles.grants(C::ManageAssignments),
  }
}

/// [`permitted`] as a gate: `Err(Unauthorized)` on denial, terminal for the
/// request — callers never continue past a denied check.
pub fn authorize(
  actor: &Actor,
  action: ClientAction,
  facts: AccessFacts,
) -> Result<()> {
  if permitted(actor, action, facts) {
    Ok(())
  } else {
    Err(Error::Unauthorized { action })
  }
}
