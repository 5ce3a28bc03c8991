//! SQL DDL for the place/record store. SQLite-first.

/// SQLite schema with:
/// - `places(lat, lon)` UNIQUE so concurrent first syncs converge on one row
/// - `records.dt` stored as INTEGER unix seconds (UTC) so range filters compare numerically
/// - `records(place_id, dt)` UNIQUE, the only guard for concurrent record writes
/// - `records.place_id` cascades on place delete (requires `PRAGMA foreign_keys = ON`)
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS places (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    UNIQUE (lat, lon)
);

CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    dt INTEGER NOT NULL,
    place_id INTEGER NOT NULL REFERENCES places(id) ON DELETE CASCADE,
    aqi INTEGER NOT NULL,
    co REAL NOT NULL,
    no REAL NOT NULL,
    no_2 REAL NOT NULL,
    o_3 REAL NOT NULL,
    so_2 REAL NOT NULL,
    pm_2_5 REAL NOT NULL,
    pm_10 REAL NOT NULL,
    nh_3 REAL NOT NULL,
    UNIQUE (place_id, dt)
);

CREATE INDEX IF NOT EXISTS idx_records_dt ON records(dt);
"#;
