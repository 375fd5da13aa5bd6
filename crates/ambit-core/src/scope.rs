//! Visibility scoping — which clients an actor may see.
//!
//! The scope is a coarse filter derived from role facts alone. It composes
//! with the orthogonal [`ClientQuery`](crate::store::ClientQuery) filters by
//! logical AND; stores apply both in one read.

use uuid::Uuid;

use crate::actor::{Actor, Role};

/// The filter predicate selecting the clients an identity may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityScope {
  /// Every client; no filter. Full-access roles.
  All,
  /// Clients whose home base is one of the given managed bases.
  Bases(Vec<Uuid>),
  /// Clients with at least one **active** assignment edge to this user,
  /// primary or secondary.
  Assigned(Uuid),
  /// No visible clients.
  Nothing,
}

impl VisibilityScope {
  /// Derive the scope for `actor`.
  ///
  /// Priority-ordered, first match wins — roles are not mutually exclusive,
  /// so the broadest applicable grant applies. `managed_bases` is the base
  /// membership of the actor, looked up by the caller; it is only consulted
  /// for base managers.
  pub fn for_actor(actor: &Actor, managed_bases: &[Uuid]) -> Self {
    if actor.roles.has_full_access() {
      return Self::All;
    }
    if actor.roles.contains(Role::BaseManager) {
      return Self::Bases(managed_bases.to_vec());
    }
    if actor.roles.contains(Role::Agent) {
      return Self::Assigned(actor.actor_id);
    }
    Self::Nothing
  }

  pub fn is_all(&self) -> bool { matches!(self, Self::All) }
}
