pub mod air_pollution;
