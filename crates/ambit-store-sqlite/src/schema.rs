//! SQL schema for the Ambit SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS clients (
    client_id    TEXT PRIMARY KEY,
    code         TEXT NOT NULL UNIQUE,
    name         TEXT NOT NULL,
    kind         TEXT NOT NULL,   -- 'pharmacy' | 'wholesaler' | 'clinic' | ...
    potential    TEXT NOT NULL,   -- 'a' | 'b' | 'c'
    base_id      TEXT NOT NULL,
    zone_id      TEXT NOT NULL,
    created_by   TEXT NOT NULL,
    contact_name TEXT,
    phone        TEXT,
    email        TEXT,
    street       TEXT,
    city         TEXT,
    latitude     REAL,
    longitude    REAL,
    active       INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    updated_at   TEXT NOT NULL
);

-- One row per (client, user) pair. Business flows only flip `active`;
-- DELETE is reserved for elevated detach and cascade on client purge.
CREATE TABLE IF NOT EXISTS assignments (
    client_id   TEXT NOT NULL REFERENCES clients(client_id) ON DELETE CASCADE,
    user_id     TEXT NOT NULL,
    role        TEXT NOT NULL,    -- 'primary' | 'secondary'
    assigned_by TEXT NOT NULL,
    assigned_at TEXT NOT NULL,    -- ISO 8601 UTC; server-assigned
    active      INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (client_id, user_id)
);

-- At most one active primary edge per client.
CREATE UNIQUE INDEX IF NOT EXISTS assignments_primary_idx
    ON assignments(client_id) WHERE role = 'primary' AND active = 1;

-- Base-management membership; owned by the identity subsystem, mirrored
-- here for scope filtering.
CREATE TABLE IF NOT EXISTS base_managers (
    user_id TEXT NOT NULL,
    base_id TEXT NOT NULL,
    PRIMARY KEY (user_id, base_id)
);

CREATE INDEX IF NOT EXISTS assignments_user_idx ON assignments(user_id);
CREATE INDEX IF NOT EXISTS clients_base_idx     ON clients(base_id);
CREATE INDEX IF NOT EXISTS clients_zone_idx     ON clients(zone_id);
CREATE INDEX IF NOT EXISTS clients_updated_idx  ON clients(updated_at);

PRAGMA user_version = 1;
";
