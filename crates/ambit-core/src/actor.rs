//! Actor identity and the canonical role taxonomy.
//!
//! Role facts are owned by an external identity subsystem; this crate only
//! consumes them. Whoever calls into the store passes the acting identity
//! explicitly — nothing here reads an ambient "current user".

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Role ────────────────────────────────────────────────────────────────────

/// A system-wide role held by an identity. Distinct from
/// [`AssignmentRole`](crate::assignment::AssignmentRole), which describes the
/// identity's position on a single client edge.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  Agent,
  BaseManager,
  CommercialAdmin,
  Admin,
  Direction,
  SuperAdmin,
}

impl Role {
  /// Whether this role grants unrestricted visibility and management rights.
  pub fn is_full_access(self) -> bool {
    matches!(
      self,
      Self::CommercialAdmin | Self::Admin | Self::Direction | Self::SuperAdmin
    )
  }

  /// Normalise an externally-supplied role code into the canonical taxonomy.
  ///
  /// The upstream identity layer historically emitted two naming schemes
  /// (`super_admin` and `ROLE_SUPER_ADMIN`); both are accepted here and
  /// collapse to one enum value. Anything else is [`Error::UnknownRoleCode`].
  pub fn from_code(code: &str) -> Result<Self> {
    let trimmed = code.trim();
    let bare = trimmed.strip_prefix("ROLE_").unwrap_or(trimmed);
    bare
      .to_ascii_lowercase()
      .parse()
      .map_err(|_| Error::UnknownRoleCode(code.to_owned()))
  }
}

// ─── RoleSet ─────────────────────────────────────────────────────────────────

/// The set of canonical roles held by one identity.
///
/// Roles are not mutually exclusive; an identity may hold several.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
  pub fn new() -> Self { Self::default() }

  /// Parse and normalise a batch of externally-supplied role codes.
  pub fn from_codes<I, S>(codes: I) -> Result<Self>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut set = BTreeSet::new();
    for code in codes {
      set.insert(Role::from_code(code.as_ref())?);
    }
    Ok(Self(set))
  }

  pub fn insert(&mut self, role: Role) { self.0.insert(role); }

  pub fn contains(&self, role: Role) -> bool { self.0.contains(&role) }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
    self.0.iter().copied()
  }

  /// Whether any held role grants unrestricted access.
  pub fn has_full_access(&self) -> bool {
    self.iter().any(Role::is_full_access)
  }
}

impl FromIterator<Role> for RoleSet {
  fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

// ─── Actor ───────────────────────────────────────────────────────────────────

/// An acting identity together with its role facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
  pub actor_id: Uuid,
  pub roles:    RoleSet,
}

impl Actor {
  pub fn new(actor_id: Uuid, roles: RoleSet) -> Self { Self { actor_id, roles } }
}
