use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::handlers::air_pollution;
use crate::service::AggregationService;

#[derive(Clone)]
pub struct AirState {
    pub aggregation: Arc<AggregationService>,
}

impl AirState {
    pub fn new(aggregation: Arc<AggregationService>) -> Self {
        Self { aggregation }
    }
}

pub fn air_router(state: AirState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/air-pollution/average", get(air_pollution::average))
        .route("/api/air-pollution/worst-city", get(air_pollution::worst_city))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
