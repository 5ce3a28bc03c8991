use crate::api::CoordinateResolver;
use crate::db::AirStore;
use crate::error::AirError;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub places: u64,
    pub records: u64,
}

pub struct DeletionService {
    resolver: Arc<dyn CoordinateResolver>,
    store: Arc<dyn AirStore>,
}

impl DeletionService {
    pub fn new(resolver: Arc<dyn CoordinateResolver>, store: Arc<dyn AirStore>) -> Self {
        Self { resolver, store }
    }

    /// Remove the city's place and every record it owns.
    pub async fn delete_city(&self, city: &str) -> Result<DeletionReport, AirError> {
        info!(city, "deleting data");

        let Some(coords) = self.resolver.coordinates(city).await? else {
            warn!(city, "could not find city");
            return Err(AirError::CityNotFound(city.to_string()));
        };

        // records go with the place through ON DELETE CASCADE in the same statement
        let records = match self.store.find(coords.lat, coords.lon).await? {
            Some(place) => self.store.count_for_place(&place).await? as u64,
            None => 0,
        };
        let places = self
            .store
            .delete_by_coordinates(coords.lat, coords.lon)
            .await?;
        if places == 0 {
            warn!(city, "there are no records in the database for this city");
            return Err(AirError::NoRecordsFound(city.to_string()));
        }

        info!(city, places, records, "deleted all the records for city");
        Ok(DeletionReport { places, records })
    }
}
