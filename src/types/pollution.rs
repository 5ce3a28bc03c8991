use serde::{Deserialize, Serialize};

use super::openweather::{Components, Reading};

/// The eight concentrations stored on every record, in column naming.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PollutantFields {
    pub co: f64,
    pub no: f64,
    pub no_2: f64,
    pub o_3: f64,
    pub so_2: f64,
    pub pm_2_5: f64,
    pub pm_10: f64,
    pub nh_3: f64,
}

impl From<Components> for PollutantFields {
    fn from(c: Components) -> Self {
        Self {
            co: c.co,
            no: c.no,
            no_2: c.no2,
            o_3: c.o3,
            so_2: c.so2,
            pm_2_5: c.pm2_5,
            pm_10: c.pm10,
            nh_3: c.nh3,
        }
    }
}

/// Measurement payload of a record, minus identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub aqi: i64,
    #[serde(flatten)]
    pub pollutants: PollutantFields,
}

impl From<&Reading> for Measurement {
    fn from(r: &Reading) -> Self {
        Self {
            aqi: r.main.aqi,
            pollutants: r.components.into(),
        }
    }
}

/// Per-field arithmetic means over a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollutionAverage {
    pub aqi: f64,
    #[serde(flatten)]
    pub pollutants: PollutantFields,
}

/// Response of the worst-city lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorstCity {
    pub city: String,
    #[serde(rename = "pollutionData")]
    pub pollution_data: PollutionAverage,
}
