use axum::{Json, extract::State};
use tracing::info;

use crate::middleware::{CityRangeQuery, RangeQuery};
use crate::types::{PollutionAverage, WorstCity};
use crate::{AirError, router::AirState};

/// GET /api/air-pollution/average?city=&from=&to=
pub async fn average(
    State(state): State<AirState>,
    CityRangeQuery { city, range }: CityRangeQuery,
) -> Result<Json<PollutionAverage>, AirError> {
    info!(city = %city, range = %range, "average requested");
    let average = state.aggregation.average_for_city(&city, &range).await?;
    Ok(Json(average))
}

/// GET /api/air-pollution/worst-city?from=&to=
pub async fn worst_city(
    State(state): State<AirState>,
    RangeQuery { range }: RangeQuery,
) -> Result<Json<WorstCity>, AirError> {
    info!(range = %range, "worst city requested");
    let worst = state.aggregation.worst_city_in_range(&range).await?;
    Ok(Json(worst))
}
