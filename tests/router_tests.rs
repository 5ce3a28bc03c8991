mod common;

use airq_ledger::router::{AirState, air_router};
use airq_ledger::service::{AggregationService, IngestionPipeline};
use airq_ledger::types::TimeRange;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use common::{FakeGeocoder, FakeSource, TURIN, TestDb, at};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn app(db: &TestDb) -> Router {
    let geocoder = Arc::new(FakeGeocoder::new().with_city("Turin", TURIN));
    let aggregation = Arc::new(AggregationService::new(geocoder, db.store.clone()));
    air_router(AirState::new(aggregation))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let json = serde_json::from_slice(&body).expect("response body was not json");
    (status, json)
}

#[tokio::test]
async fn health_is_ok() {
    let db = TestDb::new().await;
    let (status, body) = get(&app(&db), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_variables_are_listed() {
    let db = TestDb::new().await;
    let app = app(&db);

    let (status, body) = get(&app, "/api/air-pollution/average?city=Turin&to=2022-01-02").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "MISSING_QUERY");
    assert_eq!(body["missingVariables"]["city"], false);
    assert_eq!(body["missingVariables"]["from"], true);
    assert_eq!(body["missingVariables"]["to"], false);

    let (status, body) = get(&app, "/api/air-pollution/worst-city").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["missingVariables"]["from"], true);
    assert_eq!(body["missingVariables"]["to"], true);
    assert!(body["missingVariables"].get("city").is_none());
}

#[tokio::test]
async fn inverted_range_is_rejected() {
    let db = TestDb::new().await;
    let (status, body) = get(
        &app(&db),
        "/api/air-pollution/worst-city?from=2022-01-02&to=2022-01-01",
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_QUERY");
}

#[tokio::test]
async fn unparseable_instant_is_rejected() {
    let db = TestDb::new().await;
    let (status, _) = get(
        &app(&db),
        "/api/air-pollution/average?city=Turin&from=yesterday&to=2022-01-01",
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn average_returns_flat_pollutant_fields() {
    let db = TestDb::new().await;
    IngestionPipeline::new(
        Arc::new(FakeGeocoder::new().with_city("Turin", TURIN)),
        Arc::new(FakeSource::hourly(3)),
        db.store.clone(),
        8,
    )
    .sync(
        "Turin",
        TimeRange::new(at(2022, 1, 1, 0), at(2022, 1, 2, 0)).unwrap(),
    )
    .await
    .unwrap();

    let (status, body) = get(
        &app(&db),
        "/api/air-pollution/average?city=Turin&from=2022-01-01T00:00:00Z&to=2022-01-02T00:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["aqi"], 3.0);
    assert_eq!(body["pm_2_5"], 15.0);
    for field in ["co", "no", "no_2", "o_3", "so_2", "pm_10", "nh_3"] {
        assert!(body[field].is_number(), "missing field {field}");
    }

    let (status, body) = get(
        &app(&db),
        "/api/air-pollution/worst-city?from=2022-01-01&to=2022-01-02",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Turin");
    assert_eq!(body["pollutionData"]["aqi"], 3.0);
}

#[tokio::test]
async fn not_found_cases() {
    let db = TestDb::new().await;
    let app = app(&db);

    let (status, body) = get(
        &app,
        "/api/air-pollution/worst-city?from=2022-01-01&to=2022-01-02",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NO_DATA");

    let (status, body) = get(
        &app,
        "/api/air-pollution/average?city=Atlantis&from=2022-01-01&to=2022-01-02",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "CITY_NOT_FOUND");

    let (status, body) = get(
        &app,
        "/api/air-pollution/average?city=Turin&from=2022-01-01&to=2022-01-02",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "PLACE_NOT_FOUND");
}
