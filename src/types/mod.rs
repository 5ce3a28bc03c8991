pub mod cli;
pub mod geo;
pub mod openweather;
pub mod pollution;
pub mod range;

pub use geo::Coordinates;
pub use openweather::Reading;
pub use pollution::{Measurement, PollutantFields, PollutionAverage, WorstCity};
pub use range::{TimeRange, TimeWindow, parse_instant};
