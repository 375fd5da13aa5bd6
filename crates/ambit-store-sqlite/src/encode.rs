//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Enum columns store the
//! snake_case code of the variant. UUIDs are stored as hyphenated lowercase
//! strings. Contact fields map to one column each.

use ambit_core::{
  assignment::{Assignment, AssignmentRole},
  client::{Client, ClientKind, ContactInfo, GeoPoint, Potential},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enum columns ────────────────────────────────────────────────────────────

pub fn encode_kind(k: ClientKind) -> String { k.to_string() }

pub fn decode_kind(s: &str) -> Result<ClientKind> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown client kind: {s:?}")))
}

pub fn encode_potential(p: Potential) -> String { p.to_string() }

pub fn decode_potential(s: &str) -> Result<Potential> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown potential grade: {s:?}")))
}

pub fn encode_role(r: AssignmentRole) -> String { r.to_string() }

pub fn decode_role(s: &str) -> Result<AssignmentRole> {
  s.parse()
    .map_err(|_| Error::Core(ambit_core::Error::InvalidRole(s.to_owned())))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `clients` row.
pub struct RawClient {
  pub client_id:    String,
  pub code:         String,
  pub name:         String,
  pub kind:         String,
  pub potential:    String,
  pub base_id:      String,
  pub zone_id:      String,
  pub created_by:   String,
  pub contact_name: Option<String>,
  pub phone:        Option<String>,
  pub email:        Option<String>,
  pub street:       Option<String>,
  pub city:         Option<String>,
  pub latitude:     Option<f64>,
  pub longitude:    Option<f64>,
  pub active:       bool,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawClient {
  /// Read all client columns, in schema order, from a query row.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      client_id:    row.get(0)?,
      code:         row.get(1)?,
      name:         row.get(2)?,
      kind:         row.get(3)?,
      potential:    row.get(4)?,
      base_id:      row.get(5)?,
      zone_id:      row.get(6)?,
      created_by:   row.get(7)?,
      contact_name: row.get(8)?,
      phone:        row.get(9)?,
      email:        row.get(10)?,
      street:       row.get(11)?,
      city:         row.get(12)?,
      latitude:     row.get(13)?,
      longitude:    row.get(14)?,
      active:       row.get(15)?,
      created_at:   row.get(16)?,
      updated_at:   row.get(17)?,
    })
  }

  pub fn into_client(self) -> Result<Client> {
    let location = match (self.latitude, self.longitude) {
      (Some(latitude), Some(longitude)) => {
        Some(GeoPoint { latitude, longitude })
      }
      _ => None,
    };

    Ok(Client {
      client_id: decode_uuid(&self.client_id)?,
      code: self.code,
      name: self.name,
      kind: decode_kind(&self.kind)?,
      potential: decode_potential(&self.potential)?,
      base_id: decode_uuid(&self.base_id)?,
      zone_id: decode_uuid(&self.zone_id)?,
      created_by: decode_uuid(&self.created_by)?,
      contact: ContactInfo {
        contact_name: self.contact_name,
        phone:        self.phone,
        email:        self.email,
        street:       self.street,
        city:         self.city,
      },
      location,
      active: self.active,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from an `assignments` row.
pub struct RawAssignment {
  pub client_id:   String,
  pub user_id:     String,
  pub role:        String,
  pub assigned_by: String,
  pub assigned_at: String,
  pub active:      bool,
}

impl RawAssignment {
  /// Read all assignment columns, in schema order, from a query row.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      client_id:   row.get(0)?,
      user_id:     row.get(1)?,
      role:        row.get(2)?,
      assigned_by: row.get(3)?,
      assigned_at: row.get(4)?,
      active:      row.get(5)?,
    })
  }

  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      client_id:   decode_uuid(&self.client_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      role:        decode_role(&self.role)?,
      assigned_by: decode_uuid(&self.assigned_by)?,
      assigned_at: decode_dt(&self.assigned_at)?,
      active:      self.active,
    })
  }
}
