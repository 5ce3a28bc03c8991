use crate::types::PollutantFields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type PlaceId = i64;

/// A registered geocoordinate location. Never mutated after insert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub lat: f64,
    pub lon: f64,
}

/// One stored hourly measurement, unique per `(place_id, dt)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub dt: DateTime<Utc>,
    pub place_id: PlaceId,
    pub aqi: i64,
    #[serde(flatten)]
    pub pollutants: PollutantFields,
}

/// Averages for one place, as produced by the grouped worst-place query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceAverage {
    pub place: Place,
    pub samples: i64,
    pub aqi: f64,
    pub pollutants: PollutantFields,
}
