//! Wire types for the OpenWeatherMap geocoding and air-pollution APIs.

use serde::{Deserialize, Serialize};

use super::geo::Coordinates;

/// One entry of `geo/1.0/direct` or `geo/1.0/reverse`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoEntry {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl GeoEntry {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// Body of `data/2.5/air_pollution/history`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AirPollutionResponse {
    #[serde(default)]
    pub coord: Option<Coordinates>,
    #[serde(default)]
    pub list: Vec<Reading>,
}

/// A single hourly reading as delivered by the source.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Reading {
    /// Unix seconds, UTC.
    pub dt: i64,
    pub main: ReadingMain,
    pub components: Components,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ReadingMain {
    pub aqi: i64,
}

/// Concentrations in μg/m³, keyed by the source's own field names.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Components {
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: f64,
}
