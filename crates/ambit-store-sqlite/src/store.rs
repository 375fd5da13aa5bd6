//! [`SqliteStore`] — the SQLite implementation of [`ClientStore`].
//!
//! Every operation that touches more than one row (create-with-auto-assign,
//! sync, merge, promote, purge) runs inside a single transaction, so the
//! demote/promote sequence and sync's delete+insert set are atomic. The
//! partial unique index on active primary edges backstops the invariants.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, params_from_iter, types::Value};
use uuid::Uuid;

use ambit_core::{
  actor::{Actor, Role},
  assignment::{
    Assignment, AssignmentRole, AssignmentSpec, NewAssignment,
    validate_desired_set,
  },
  client::{Client, ClientPatch, NewClient},
  scope::VisibilityScope,
  store::{ClientQuery, ClientStore},
};

use crate::{
  Error, Result,
  encode::{
    RawAssignment, RawClient, decode_uuid, encode_dt, encode_kind,
    encode_potential, encode_role, encode_uuid,
  },
  schema::SCHEMA,
};

const CLIENT_COLS: &str = "client_id, code, name, kind, potential, base_id, \
                           zone_id, created_by, contact_name, phone, email, \
                           street, city, latitude, longitude, active, \
                           created_at, updated_at";

const EDGE_COLS: &str =
  "client_id, user_id, role, assigned_by, assigned_at, active";

// ─── Row encoding ────────────────────────────────────────────────────────────

/// Client columns as owned SQLite values, in `CLIENT_COLS` order.
fn client_values(c: &Client) -> Vec<Value> {
  fn text_opt(o: &Option<String>) -> Value {
    o.clone().map(Value::Text).unwrap_or(Value::Null)
  }

  vec![
    Value::Text(encode_uuid(c.client_id)),
    Value::Text(c.code.clone()),
    Value::Text(c.name.clone()),
    Value::Text(encode_kind(c.kind)),
    Value::Text(encode_potential(c.potential)),
    Value::Text(encode_uuid(c.base_id)),
    Value::Text(encode_uuid(c.zone_id)),
    Value::Text(encode_uuid(c.created_by)),
    text_opt(&c.contact.contact_name),
    text_opt(&c.contact.phone),
    text_opt(&c.contact.email),
    text_opt(&c.contact.street),
    text_opt(&c.contact.city),
    c.location.map(|l| Value::Real(l.latitude)).unwrap_or(Value::Null),
    c.location.map(|l| Value::Real(l.longitude)).unwrap_or(Value::Null),
    Value::Integer(i64::from(c.active)),
    Value::Text(encode_dt(c.created_at)),
    Value::Text(encode_dt(c.updated_at)),
  ]
}

/// Assignment columns as owned SQLite values, in `EDGE_COLS` order.
fn edge_values(a: &Assignment) -> Vec<Value> {
  vec![
    Value::Text(encode_uuid(a.client_id)),
    Value::Text(encode_uuid(a.user_id)),
    Value::Text(encode_role(a.role)),
    Value::Text(encode_uuid(a.assigned_by)),
    Value::Text(encode_dt(a.assigned_at)),
    Value::Integer(i64::from(a.active)),
  ]
}

// ─── In-transaction helpers ──────────────────────────────────────────────────

fn client_exists(
  conn: &rusqlite::Connection,
  client_id: &str,
) -> rusqlite::Result<bool> {
  conn
    .query_row(
      "SELECT 1 FROM clients WHERE client_id = ?1",
      rusqlite::params![client_id],
      |_| Ok(true),
    )
    .optional()
    .map(|found| found.unwrap_or(false))
}

fn edge_row(
  conn: &rusqlite::Connection,
  client_id: &str,
  user_id: &str,
) -> rusqlite::Result<Option<RawAssignment>> {
  conn
    .query_row(
      &format!(
        "SELECT {EDGE_COLS} FROM assignments
         WHERE client_id = ?1 AND user_id = ?2"
      ),
      rusqlite::params![client_id, user_id],
      RawAssignment::from_row,
    )
    .optional()
}

/// Count active edges for a client, optionally ignoring one user.
fn count_active_edges(
  conn: &rusqlite::Connection,
  client_id: &str,
  except_user: Option<&str>,
) -> rusqlite::Result<i64> {
  match except_user {
    Some(user_id) => conn.query_row(
      "SELECT COUNT(*) FROM assignments
       WHERE client_id = ?1 AND active = 1 AND user_id != ?2",
      rusqlite::params![client_id, user_id],
      |row| row.get(0),
    ),
    None => conn.query_row(
      "SELECT COUNT(*) FROM assignments WHERE client_id = ?1 AND active = 1",
      rusqlite::params![client_id],
      |row| row.get(0),
    ),
  }
}

/// Count active primary edges for a client, optionally ignoring one user.
fn count_active_primaries(
  conn: &rusqlite::Connection,
  client_id: &str,
  except_user: Option<&str>,
) -> rusqlite::Result<i64> {
  match except_user {
    Some(user_id) => conn.query_row(
      "SELECT COUNT(*) FROM assignments
       WHERE client_id = ?1 AND active = 1 AND role = 'primary'
         AND user_id != ?2",
      rusqlite::params![client_id, user_id],
      |row| row.get(0),
    ),
    None => conn.query_row(
      "SELECT COUNT(*) FROM assignments
       WHERE client_id = ?1 AND active = 1 AND role = 'primary'",
      rusqlite::params![client_id],
      |row| row.get(0),
    ),
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Ambit client store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Flip the client's `active` flag, bumping `updated_at`.
  async fn set_client_active(&self, id: Uuid, active: bool) -> Result<Client> {
    let id_str = encode_uuid(id);
    let now_str = encode_dt(Utc::now());

    let updated: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE clients SET active = ?1, updated_at = ?2
           WHERE client_id = ?3",
          rusqlite::params![active, now_str, id_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(ambit_core::Error::ClientNotFound(id).into());
    }

    self
      .get_client(id)
      .await?
      .ok_or_else(|| ambit_core::Error::ClientNotFound(id).into())
  }

  async fn edges_where(
    &self,
    column: &'static str,
    id: Uuid,
    include_inactive: bool,
  ) -> Result<Vec<Assignment>> {
    let id_str = encode_uuid(id);

    let raws: Vec<RawAssignment> = self
      .conn
      .call(move |conn| {
        let active_cond = if include_inactive { "" } else { " AND active = 1" };
        let sql = format!(
          "SELECT {EDGE_COLS} FROM assignments
           WHERE {column} = ?1{active_cond}
           ORDER BY client_id, user_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawAssignment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAssignment::into_assignment).collect()
  }
}

// ─── ClientStore impl ────────────────────────────────────────────────────────

impl ClientStore for SqliteStore {
  type Error = Error;

  // ── Clients ───────────────────────────────────────────────────────────────

  async fn create_client(&self, input: NewClient, actor: Actor) -> Result<Client> {
    let now = Utc::now();
    let client = Client {
      client_id:  Uuid::new_v4(),
      code:       input.code,
      name:       input.name,
      kind:       input.kind,
      potential:  input.potential,
      base_id:    input.base_id,
      zone_id:    input.zone_id,
      created_by: actor.actor_id,
      contact:    input.contact,
      location:   input.location,
      active:     true,
      created_at: now,
      updated_at: now,
    };

    // An agent creating a client becomes its responsible commercial in the
    // same write — no separate attach call.
    let auto_edge = actor.roles.contains(Role::Agent).then(|| Assignment {
      client_id:   client.client_id,
      user_id:     actor.actor_id,
      role:        AssignmentRole::Primary,
      assigned_by: actor.actor_id,
      assigned_at: now,
      active:      true,
    });

    let client_row = client_values(&client);
    let edge_row_values = auto_edge.as_ref().map(edge_values);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          &format!(
            "INSERT INTO clients ({CLIENT_COLS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
          ),
          params_from_iter(client_row),
        )?;
        if let Some(values) = edge_row_values {
          tx.execute(
            &format!(
              "INSERT INTO assignments ({EDGE_COLS}) VALUES (?, ?, ?, ?, ?, ?)"
            ),
            params_from_iter(values),
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(client)
  }

  async fn get_client(&self, id: Uuid) -> Result<Option<Client>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawClient> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {CLIENT_COLS} FROM clients WHERE client_id = ?1"
              ),
              rusqlite::params![id_str],
              RawClient::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawClient::into_client).transpose()
  }

  async fn update_client(&self, id: Uuid, patch: ClientPatch) -> Result<Client> {
    let id_str = encode_uuid(id);

    let mut sets: Vec<&'static str> = vec!["updated_at = ?"];
    let mut values: Vec<Value> = vec![Value::Text(encode_dt(Utc::now()))];

    if let Some(name) = patch.name {
      sets.push("name = ?");
      values.push(Value::Text(name));
    }
    if let Some(kind) = patch.kind {
      sets.push("kind = ?");
      values.push(Value::Text(encode_kind(kind)));
    }
    if let Some(potential) = patch.potential {
      sets.push("potential = ?");
      values.push(Value::Text(encode_potential(potential)));
    }
    if let Some(zone_id) = patch.zone_id {
      sets.push("zone_id = ?");
      values.push(Value::Text(encode_uuid(zone_id)));
    }
    if let Some(contact) = patch.contact {
      sets.extend([
        "contact_name = ?",
        "phone = ?",
        "email = ?",
        "street = ?",
        "city = ?",
      ]);
      for field in [
        contact.contact_name,
        contact.phone,
        contact.email,
        contact.street,
        contact.city,
      ] {
        values.push(field.map(Value::Text).unwrap_or(Value::Null));
      }
    }
    if let Some(location) = patch.location {
      sets.extend(["latitude = ?", "longitude = ?"]);
      values.push(Value::Real(location.latitude));
      values.push(Value::Real(location.longitude));
    }

    values.push(Value::Text(id_str));
    let sql = format!(
      "UPDATE clients SET {} WHERE client_id = ?",
      sets.join(", ")
    );

    let updated: usize = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, params_from_iter(values))?))
      .await?;

    if updated == 0 {
      return Err(ambit_core::Error::ClientNotFound(id).into());
    }

    self
      .get_client(id)
      .await?
      .ok_or_else(|| ambit_core::Error::ClientNotFound(id).into())
  }

  async fn retire_client(&self, id: Uuid) -> Result<Client> {
    self.set_client_active(id, false).await
  }

  async fn restore_client(&self, id: Uuid) -> Result<Client> {
    self.set_client_active(id, true).await
  }

  async fn purge_client(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM assignments WHERE client_id = ?1",
          rusqlite::params![id_str],
        )?;
        let deleted = tx.execute(
          "DELETE FROM clients WHERE client_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    if deleted == 0 {
      return Err(ambit_core::Error::ClientNotFound(id).into());
    }
    Ok(())
  }

  async fn list_clients(
    &self,
    scope: &VisibilityScope,
    query: &ClientQuery,
  ) -> Result<Vec<Client>> {
    let scope = scope.clone();
    let query = query.clone();

    let raws: Vec<RawClient> = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<String> = vec![];
        let mut values: Vec<Value> = vec![];

        match &scope {
          VisibilityScope::All => {}
          VisibilityScope::Bases(bases) => {
            if bases.is_empty() {
              conds.push("1 = 0".into());
            } else {
              let marks = vec!["?"; bases.len()].join(", ");
              conds.push(format!("base_id IN ({marks})"));
              values
                .extend(bases.iter().map(|b| Value::Text(encode_uuid(*b))));
            }
          }
          VisibilityScope::Assigned(user_id) => {
            conds.push(
              "EXISTS (SELECT 1 FROM assignments a
                 WHERE a.client_id = clients.client_id
                   AND a.user_id = ? AND a.active = 1)"
                .into(),
            );
            values.push(Value::Text(encode_uuid(*user_id)));
          }
          VisibilityScope::Nothing => conds.push("1 = 0".into()),
        }

        if let Some(text) = &query.text {
          let pattern = format!("%{text}%");
          conds.push(
            "(code LIKE ? OR name LIKE ? OR contact_name LIKE ? OR city LIKE ?)"
              .into(),
          );
          for _ in 0..4 {
            values.push(Value::Text(pattern.clone()));
          }
        }
        if let Some(kind) = query.kind {
          conds.push("kind = ?".into());
          values.push(Value::Text(encode_kind(kind)));
        }
        if let Some(city) = &query.city {
          conds.push("city = ?".into());
          values.push(Value::Text(city.clone()));
        }
        if let Some(zone_id) = query.zone_id {
          conds.push("zone_id = ?".into());
          values.push(Value::Text(encode_uuid(zone_id)));
        }
        if let Some(base_id) = query.base_id {
          conds.push("base_id = ?".into());
          values.push(Value::Text(encode_uuid(base_id)));
        }
        if let Some(user_id) = query.assigned_to {
          conds.push(
            "EXISTS (SELECT 1 FROM assignments a
               WHERE a.client_id = clients.client_id
                 AND a.user_id = ? AND a.active = 1)"
              .into(),
          );
          values.push(Value::Text(encode_uuid(user_id)));
        }
        if let Some(potential) = query.potential {
          conds.push("potential = ?".into());
          values.push(Value::Text(encode_potential(potential)));
        }
        if let Some(after) = query.updated_after {
          conds.push("updated_at > ?".into());
          values.push(Value::Text(encode_dt(after)));
        }
        if !query.include_retired {
          conds.push("active = 1".into());
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {CLIENT_COLS} FROM clients
           {where_clause}
           ORDER BY code
           LIMIT ? OFFSET ?"
        );
        values.push(Value::Integer(query.limit.unwrap_or(100) as i64));
        values.push(Value::Integer(query.offset.unwrap_or(0) as i64));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(values), RawClient::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawClient::into_client).collect()
  }

  // ── Assignment edges — writes ─────────────────────────────────────────────

  async fn attach_edge(
    &self,
    client_id: Uuid,
    input: NewAssignment,
  ) -> Result<Assignment> {
    let user_id = input.user_id;
    let edge = Assignment {
      client_id,
      user_id,
      role: input.role,
      assigned_by: input.assigned_by,
      assigned_at: Utc::now(),
      active: input.active,
    };

    let values = edge_values(&edge);
    let client_str = encode_uuid(client_id);
    let user_str = encode_uuid(user_id);
    let wants_active_primary = edge.active && edge.role.is_primary();

    let out: Result<()> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !client_exists(&tx, &client_str)? {
          return Ok(Err(ambit_core::Error::ClientNotFound(client_id).into()));
        }
        if edge_row(&tx, &client_str, &user_str)?.is_some() {
          return Ok(Err(
            ambit_core::Error::DuplicateEdge { client_id, user_id }.into(),
          ));
        }
        if wants_active_primary
          && count_active_primaries(&tx, &client_str, None)? > 0
        {
          return Ok(Err(
            ambit_core::Error::DuplicatePrimary(client_id).into(),
          ));
        }
        tx.execute(
          &format!(
            "INSERT INTO assignments ({EDGE_COLS}) VALUES (?, ?, ?, ?, ?, ?)"
          ),
          params_from_iter(values),
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    out?;

    Ok(edge)
  }

  async fn sync_assignments(
    &self,
    client_id: Uuid,
    specs: Vec<AssignmentSpec>,
    assigned_by: Uuid,
  ) -> Result<Vec<Assignment>> {
    validate_desired_set(client_id, &specs).map_err(Error::Core)?;

    let now = Utc::now();
    let edges: Vec<Assignment> = specs
      .iter()
      .map(|s| Assignment {
        client_id,
        user_id: s.user_id,
        role: s.role,
        assigned_by,
        assigned_at: now,
        active: s.active,
      })
      .collect();

    let rows: Vec<Vec<Value>> = edges.iter().map(edge_values).collect();
    let client_str = encode_uuid(client_id);

    let out: Result<()> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !client_exists(&tx, &client_str)? {
          return Ok(Err(ambit_core::Error::ClientNotFound(client_id).into()));
        }
        tx.execute(
          "DELETE FROM assignments WHERE client_id = ?1",
          rusqlite::params![client_str],
        )?;
        for row in rows {
          tx.execute(
            &format!(
              "INSERT INTO assignments ({EDGE_COLS}) VALUES (?, ?, ?, ?, ?, ?)"
            ),
            params_from_iter(row),
          )?;
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    out?;

    Ok(edges)
  }

  async fn merge_assignments(
    &self,
    client_id: Uuid,
    specs: Vec<AssignmentSpec>,
    assigned_by: Uuid,
  ) -> Result<Vec<Assignment>> {
    let mut seen = BTreeSet::new();
    for spec in &specs {
      if !seen.insert(spec.user_id) {
        return Err(
          ambit_core::Error::DuplicateEdge { client_id, user_id: spec.user_id }
            .into(),
        );
      }
    }

    let now = Utc::now();
    let edges: Vec<Assignment> = specs
      .iter()
      .map(|s| Assignment {
        client_id,
        user_id: s.user_id,
        role: s.role,
        assigned_by,
        assigned_at: now,
        active: s.active,
      })
      .collect();

    // Upsert demotions before active primaries so the partial unique index
    // never sees a transient second primary.
    let mut rows: Vec<(bool, Vec<Value>)> = edges
      .iter()
      .map(|e| (e.active && e.role.is_primary(), edge_values(e)))
      .collect();
    rows.sort_by_key(|(wants_active_primary, _)| *wants_active_primary);

    // Prospective post-merge state per user, for invariant checks.
    let overlay: Vec<(String, String, bool)> = edges
      .iter()
      .map(|e| (encode_uuid(e.user_id), encode_role(e.role), e.active))
      .collect();
    let client_str = encode_uuid(client_id);

    let out: Result<()> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !client_exists(&tx, &client_str)? {
          return Ok(Err(ambit_core::Error::ClientNotFound(client_id).into()));
        }

        let mut state: BTreeMap<String, (String, bool)> = BTreeMap::new();
        {
          let mut stmt = tx.prepare(
            "SELECT user_id, role, active FROM assignments
             WHERE client_id = ?1",
          )?;
          let current = stmt
            .query_map(rusqlite::params![client_str], |row| {
              Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
              ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          for (user, role, active) in current {
            state.insert(user, (role, active));
          }
        }
        for (user, role, active) in &overlay {
          state.insert(user.clone(), (role.clone(), *active));
        }

        if !state.values().any(|(_, active)| *active) {
          return Ok(Err(
            ambit_core::Error::LastActiveAssignment(client_id).into(),
          ));
        }
        let primaries = state
          .values()
          .filter(|(role, active)| *active && role == "primary")
          .count();
        if primaries > 1 {
          return Ok(Err(
            ambit_core::Error::DuplicatePrimary(client_id).into(),
          ));
        }

        for (_, row) in rows {
          tx.execute(
            &format!(
              "INSERT INTO assignments ({EDGE_COLS}) VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(client_id, user_id) DO UPDATE SET
                 role = excluded.role,
                 assigned_by = excluded.assigned_by,
                 assigned_at = excluded.assigned_at,
                 active = excluded.active"
            ),
            params_from_iter(row),
          )?;
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    out?;

    Ok(edges)
  }

  async fn update_edge_role(
    &self,
    client_id: Uuid,
    user_id: Uuid,
    role: AssignmentRole,
  ) -> Result<Assignment> {
    let client_str = encode_uuid(client_id);
    let user_str = encode_uuid(user_id);
    let role_str = encode_role(role);
    let promoting = role.is_primary();

    let out: Result<RawAssignment> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(existing) = edge_row(&tx, &client_str, &user_str)? else {
          return Ok(Err(
            ambit_core::Error::EdgeNotFound { client_id, user_id }.into(),
          ));
        };
        if promoting
          && existing.active
          && count_active_primaries(&tx, &client_str, Some(user_str.as_str()))? > 0
        {
          return Ok(Err(
            ambit_core::Error::DuplicatePrimary(client_id).into(),
          ));
        }
        tx.execute(
          "UPDATE assignments SET role = ?1
           WHERE client_id = ?2 AND user_id = ?3",
          rusqlite::params![role_str, client_str, user_str],
        )?;
        tx.commit()?;

        let mut updated = existing;
        updated.role = role_str.clone();
        Ok(Ok(updated))
      })
      .await?;

    out?.into_assignment()
  }

  async fn deactivate_edge(
    &self,
    client_id: Uuid,
    user_id: Uuid,
  ) -> Result<Assignment> {
    let client_str = encode_uuid(client_id);
    let user_str = encode_uuid(user_id);

    let out: Result<RawAssignment> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(existing) = edge_row(&tx, &client_str, &user_str)? else {
          return Ok(Err(
            ambit_core::Error::EdgeNotFound { client_id, user_id }.into(),
          ));
        };
        if existing.active {
          if count_active_edges(&tx, &client_str, Some(user_str.as_str()))? == 0 {
            return Ok(Err(
              ambit_core::Error::LastActiveAssignment(client_id).into(),
            ));
          }
          tx.execute(
            "UPDATE assignments SET active = 0
             WHERE client_id = ?1 AND user_id = ?2",
            rusqlite::params![client_str, user_str],
          )?;
        }
        tx.commit()?;

        let mut updated = existing;
        updated.active = false;
        Ok(Ok(updated))
      })
      .await?;

    out?.into_assignment()
  }

  async fn detach_edge(&self, client_id: Uuid, user_id: Uuid) -> Result<()> {
    let client_str = encode_uuid(client_id);
    let user_str = encode_uuid(user_id);

    let out: Result<()> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(existing) = edge_row(&tx, &client_str, &user_str)? else {
          return Ok(Err(
            ambit_core::Error::EdgeNotFound { client_id, user_id }.into(),
          ));
        };
        if existing.active
          && count_active_edges(&tx, &client_str, Some(user_str.as_str()))? == 0
        {
          return Ok(Err(
            ambit_core::Error::LastActiveAssignment(client_id).into(),
          ));
        }
        tx.execute(
          "DELETE FROM assignments WHERE client_id = ?1 AND user_id = ?2",
          rusqlite::params![client_str, user_str],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    out
  }

  async fn promote_to_primary(
    &self,
    client_id: Uuid,
    user_id: Uuid,
    assigned_by: Uuid,
  ) -> Result<Assignment> {
    let now = Utc::now();
    let client_str = encode_uuid(client_id);
    let user_str = encode_uuid(user_id);
    let by_str = encode_uuid(assigned_by);
    let now_str = encode_dt(now);

    let out: Result<()> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !client_exists(&tx, &client_str)? {
          return Ok(Err(ambit_core::Error::ClientNotFound(client_id).into()));
        }
        // Demote every active primary, then install the target. Both steps
        // commit together or not at all.
        tx.execute(
          "UPDATE assignments
           SET role = 'secondary', assigned_by = ?1, assigned_at = ?2
           WHERE client_id = ?3 AND role = 'primary' AND active = 1",
          rusqlite::params![by_str, now_str, client_str],
        )?;
        tx.execute(
          "INSERT INTO assignments (client_id, user_id, role, assigned_by,
                                    assigned_at, active)
           VALUES (?1, ?2, 'primary', ?3, ?4, 1)
           ON CONFLICT(client_id, user_id) DO UPDATE SET
             role = 'primary',
             active = 1,
             assigned_by = excluded.assigned_by,
             assigned_at = excluded.assigned_at",
          rusqlite::params![client_str, user_str, by_str, now_str],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    out?;

    Ok(Assignment {
      client_id,
      user_id,
      role: AssignmentRole::Primary,
      assigned_by,
      assigned_at: now,
      active: true,
    })
  }

  // ── Assignment edges — reads ──────────────────────────────────────────────

  async fn edges_for_client(
    &self,
    client_id: Uuid,
    include_inactive: bool,
  ) -> Result<Vec<Assignment>> {
    self.edges_where("client_id", client_id, include_inactive).await
  }

  async fn edges_for_user(
    &self,
    user_id: Uuid,
    include_inactive: bool,
  ) -> Result<Vec<Assignment>> {
    self.edges_where("user_id", user_id, include_inactive).await
  }

  async fn active_edge_exists(
    &self,
    client_id: Uuid,
    user_id: Uuid,
  ) -> Result<bool> {
    let client_str = encode_uuid(client_id);
    let user_str = encode_uuid(user_id);

    let found: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM assignments
               WHERE client_id = ?1 AND user_id = ?2 AND active = 1",
              rusqlite::params![client_str, user_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(found)
  }

  // ── Base management membership ────────────────────────────────────────────

  async fn managed_bases(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT base_id FROM base_managers
           WHERE user_id = ?1 ORDER BY base_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.iter().map(|s| decode_uuid(s)).collect()
  }

  async fn set_managed_bases(
    &self,
    user_id: Uuid,
    base_ids: Vec<Uuid>,
  ) -> Result<()> {
    let user_str = encode_uuid(user_id);
    let base_strs: Vec<String> =
      base_ids.iter().copied().map(encode_uuid).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM base_managers WHERE user_id = ?1",
          rusqlite::params![user_str],
        )?;
        for base_str in &base_strs {
          tx.execute(
            "INSERT INTO base_managers (user_id, base_id) VALUES (?1, ?2)",
            rusqlite::params![user_str, base_str],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }
}
