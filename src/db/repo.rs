//! Store seams consumed by the services.

use crate::db::models::{Place, PlaceAverage, Record};
use crate::error::AirError;
use crate::types::{Measurement, PollutionAverage, TimeRange};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Maps a coordinate pair to a stable place identity.
#[async_trait]
pub trait PlaceRegistry: Send + Sync {
    /// Get-or-create the place for exact coordinates. A lost insert race
    /// resolves to the winner's row.
    async fn resolve(&self, lat: f64, lon: f64) -> Result<Place, AirError>;

    /// Look up a place without creating it.
    async fn find(&self, lat: f64, lon: f64) -> Result<Option<Place>, AirError>;

    /// Delete a place (and, by cascade, its records). Returns rows affected;
    /// zero means "not found".
    async fn delete_by_coordinates(&self, lat: f64, lon: f64) -> Result<u64, AirError>;
}

/// Maps `(place, dt)` to a measurement.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert if absent, otherwise return the stored record untouched.
    /// The flag is `true` only when this call created the row.
    async fn get_or_create(
        &self,
        place: &Place,
        dt: DateTime<Utc>,
        measurement: Measurement,
    ) -> Result<(Record, bool), AirError>;

    /// Per-field means for one place over `[from, to)`; `None` when empty.
    async fn query_average(
        &self,
        place: &Place,
        range: &TimeRange,
    ) -> Result<Option<PollutionAverage>, AirError>;

    /// Place with the highest mean AQI over `[from, to)`; ties go to the
    /// lowest place id. `None` when the range holds no records.
    async fn query_worst_average_across_places(
        &self,
        range: &TimeRange,
    ) -> Result<Option<PlaceAverage>, AirError>;

    /// Remove every record of a place. Returns rows removed.
    async fn delete_by_place(&self, place: &Place) -> Result<u64, AirError>;

    async fn count_for_place(&self, place: &Place) -> Result<i64, AirError>;

    /// Records of a place ordered by `dt`.
    async fn list_for_place(&self, place: &Place) -> Result<Vec<Record>, AirError>;
}

/// Combined store trait.
#[async_trait]
pub trait AirStore: PlaceRegistry + RecordStore + Send + Sync {
    /// Create tables and indexes if missing.
    async fn init_schema(&self) -> Result<(), AirError>;
}
