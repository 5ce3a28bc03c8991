//! Upstream collaborators: geocoding and pollution history.

pub mod openweather_api;

use crate::error::AirError;
use crate::types::{Coordinates, Reading, TimeWindow};
use async_trait::async_trait;

pub use openweather_api::OpenWeatherMapClient;

/// City name <-> coordinates.
#[async_trait]
pub trait CoordinateResolver: Send + Sync {
    /// `Ok(None)` when the geocoder has no match for `city`.
    async fn coordinates(&self, city: &str) -> Result<Option<Coordinates>, AirError>;

    /// Display name for a coordinate pair, `Ok(None)` when unknown.
    async fn name(&self, coords: Coordinates) -> Result<Option<String>, AirError>;
}

/// Historical readings for a location over one window.
#[async_trait]
pub trait PollutionSource: Send + Sync {
    async fn readings(
        &self,
        coords: Coordinates,
        window: &TimeWindow,
    ) -> Result<Vec<Reading>, AirError>;
}
