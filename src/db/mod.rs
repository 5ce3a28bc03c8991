//! Database module: models, schema and the SQLite-backed store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `repo.rs`: store traits the services depend on
//! - `sqlite.rs`: `SqliteStore`, the production implementation

pub mod models;
pub mod repo;
pub mod schema;
pub mod sqlite;

pub use models::{Place, PlaceAverage, PlaceId, Record};
pub use repo::{AirStore, PlaceRegistry, RecordStore};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, SqliteStore};
