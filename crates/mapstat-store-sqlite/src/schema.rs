//! SQL schema for the mapstat SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS layers (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    color_theme TEXT NOT NULL DEFAULT 'blue',
    suffix      TEXT NOT NULL DEFAULT '',
    is_active   INTEGER NOT NULL DEFAULT 1
);

-- Static reference geography: oblasts and their raions.
CREATE TABLE IF NOT EXISTS regions (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS raions (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    name             TEXT NOT NULL,
    parent_region_id INTEGER NOT NULL REFERENCES regions(id),
    UNIQUE (name, parent_region_id)
);

-- Raw facts. At most one row per (layer, unit, period); writes overwrite
-- the value in place, no edit history is kept.
CREATE TABLE IF NOT EXISTS region_values (
    layer_id  INTEGER NOT NULL REFERENCES layers(id),
    region_id INTEGER NOT NULL REFERENCES regions(id),
    value     REAL NOT NULL,
    period    TEXT NOT NULL,   -- ISO 8601 date; first of month by convention
    PRIMARY KEY (layer_id, region_id, period)
);

CREATE TABLE IF NOT EXISTS raion_values (
    layer_id INTEGER NOT NULL REFERENCES layers(id),
    raion_id INTEGER NOT NULL REFERENCES raions(id),
    value    REAL NOT NULL,
    period   TEXT NOT NULL,
    PRIMARY KEY (layer_id, raion_id, period)
);

CREATE INDEX IF NOT EXISTS region_values_layer_idx ON region_values(layer_id, period);
CREATE INDEX IF NOT EXISTS raion_values_layer_idx  ON raion_values(layer_id, period);

PRAGMA user_version = 1;
";
