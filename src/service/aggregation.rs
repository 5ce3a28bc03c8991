use crate::api::CoordinateResolver;
use crate::db::AirStore;
use crate::error::AirError;
use crate::types::{Coordinates, PollutionAverage, TimeRange, WorstCity};
use std::sync::Arc;
use tracing::{debug, error};

/// Read-side queries over stored records.
pub struct AggregationService {
    resolver: Arc<dyn CoordinateResolver>,
    store: Arc<dyn AirStore>,
}

impl AggregationService {
    pub fn new(resolver: Arc<dyn CoordinateResolver>, store: Arc<dyn AirStore>) -> Self {
        Self { resolver, store }
    }

    /// Mean of every field for `city` over `[from, to)`.
    pub async fn average_for_city(
        &self,
        city: &str,
        range: &TimeRange,
    ) -> Result<PollutionAverage, AirError> {
        let coords = self
            .resolver
            .coordinates(city)
            .await?
            .ok_or_else(|| AirError::CityNotFound(city.to_string()))?;

        let place = self
            .store
            .find(coords.lat, coords.lon)
            .await?
            .ok_or_else(|| AirError::PlaceNotFound(city.to_string()))?;

        let average = self
            .store
            .query_average(&place, range)
            .await?
            .ok_or(AirError::NoDataFound)?;
        debug!(city, place_id = place.id, range = %range, "average computed");
        Ok(average)
    }

    /// City with the highest mean AQI over `[from, to)`.
    pub async fn worst_city_in_range(&self, range: &TimeRange) -> Result<WorstCity, AirError> {
        let worst = self
            .store
            .query_worst_average_across_places(range)
            .await?
            .ok_or(AirError::NoDataFound)?;

        let coords = Coordinates::new(worst.place.lat, worst.place.lon);
        let name = match self.resolver.name(coords).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                error!(place_id = worst.place.id, %coords, "reverse geocoding returned nothing");
                return Err(AirError::ReverseGeocodeFailed {
                    lat: coords.lat,
                    lon: coords.lon,
                });
            }
            Err(e) => {
                error!(place_id = worst.place.id, error = %e, "reverse geocoding failed");
                return Err(AirError::ReverseGeocodeFailed {
                    lat: coords.lat,
                    lon: coords.lon,
                });
            }
        };

        Ok(WorstCity {
            city: name,
            pollution_data: PollutionAverage {
                aqi: worst.aqi,
                pollutants: worst.pollutants,
            },
        })
    }
}
