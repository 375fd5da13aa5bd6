//! Client — a commercial account tracked by the field-sales backend.
//!
//! A client owns no behaviour of its own; everything interesting happens on
//! its assignment edges. Contact and geolocation fields are stored verbatim
//! for the presentation layers — no geometry is ever computed here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Categoricals ────────────────────────────────────────────────────────────

/// The commercial category of a client.
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
pub enum ClientKind {
  Pharmacy,
  Wholesaler,
  Clinic,
  Retailer,
  Other,
}

/// Ordinal potential grade. `A` is the highest.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Potential {
  A,
  B,
  C,
}

// ─── Contact & location ──────────────────────────────────────────────────────

/// Free-form contact fields, passed through to presentation layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
  pub contact_name: Option<String>,
  pub phone:        Option<String>,
  pub email:        Option<String>,
  pub street:       Option<String>,
  pub city:         Option<String>,
}

/// A stored latitude/longitude pair. Never computed on, only carried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub latitude:  f64,
  pub longitude: f64,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// A commercial account. `active = false` marks a retired client; the row is
/// kept for history until an elevated purge removes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
  pub client_id:  Uuid,
  pub code:       String,
  pub name:       String,
  pub kind:       ClientKind,
  pub potential:  Potential,
  /// The home base this client belongs to.
  pub base_id:    Uuid,
  pub zone_id:    Uuid,
  /// Identity that created the record.
  pub created_by: Uuid,
  pub contact:    ContactInfo,
  pub location:   Option<GeoPoint>,
  pub active:     bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

// ─── NewClient ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::ClientStore::create_client`].
/// Identifier, timestamps and `created_by` are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
  pub code:      String,
  pub name:      String,
  pub kind:      ClientKind,
  pub potential: Potential,
  pub base_id:   Uuid,
  pub zone_id:   Uuid,
  #[serde(default)]
  pub contact:   ContactInfo,
  pub location:  Option<GeoPoint>,
}

// ─── ClientPatch ─────────────────────────────────────────────────────────────

/// Partial update for [`crate::store::ClientStore::update_client`].
/// `None` fields are left untouched; `code`, `base_id` and provenance fields
/// are immutable after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientPatch {
  pub name:      Option<String>,
  pub kind:      Option<ClientKind>,
  pub potential: Option<Potential>,
  pub zone_id:   Option<Uuid>,
  pub contact:   Option<ContactInfo>,
  pub location:  Option<GeoPoint>,
}
