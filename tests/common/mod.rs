//! Shared fixtures: in-process upstream fakes and a throwaway SQLite store.
#![allow(dead_code)]

use airq_ledger::AirError;
use airq_ledger::api::{CoordinateResolver, PollutionSource};
use airq_ledger::db::{
    AirStore, Place, PlaceAverage, PlaceRegistry, Record, RecordStore, SqliteStore,
};
use airq_ledger::types::openweather::{Components, ReadingMain};
use airq_ledger::types::{
    Coordinates, Measurement, PollutionAverage, Reading, TimeRange, TimeWindow,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Timelike, Utc};
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const TURIN: Coordinates = Coordinates {
    lat: 45.0703,
    lon: 7.6869,
};
pub const MILAN: Coordinates = Coordinates {
    lat: 45.4642,
    lon: 9.19,
};

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// Temp-file database removed on drop.
pub struct TestDb {
    pub store: Arc<SqliteStore>,
    path: PathBuf,
}

impl TestDb {
    pub async fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!(
            "airq-test-{}-{}.sqlite",
            std::process::id(),
            nanos
        ));
        let database_url = format!("sqlite:{}", path.display());
        let store = SqliteStore::connect(&database_url, 5)
            .await
            .expect("failed to open test database");
        Self {
            store: Arc::new(store),
            path,
        }
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut p = self.path.clone().into_os_string();
            p.push(suffix);
            let _ = std::fs::remove_file(p);
        }
    }
}

/// Geocoder backed by a fixed table.
#[derive(Default)]
pub struct FakeGeocoder {
    cities: HashMap<String, Coordinates>,
    reverse_enabled: bool,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self {
            cities: HashMap::new(),
            reverse_enabled: true,
        }
    }

    pub fn with_city(mut self, name: &str, coords: Coordinates) -> Self {
        self.cities.insert(name.to_string(), coords);
        self
    }

    pub fn without_reverse(mut self) -> Self {
        self.reverse_enabled = false;
        self
    }
}

#[async_trait]
impl CoordinateResolver for FakeGeocoder {
    async fn coordinates(&self, city: &str) -> Result<Option<Coordinates>, AirError> {
        Ok(self.cities.get(city).copied())
    }

    async fn name(&self, coords: Coordinates) -> Result<Option<String>, AirError> {
        if !self.reverse_enabled {
            return Ok(None);
        }
        Ok(self
            .cities
            .iter()
            .find(|(_, c)| **c == coords)
            .map(|(name, _)| name.clone()))
    }
}

/// History source emitting one reading per hour of the requested window.
pub struct FakeSource {
    aqi: i64,
    failing: HashSet<DateTime<Utc>>,
    empty: HashSet<DateTime<Utc>>,
    calls: Mutex<Vec<TimeWindow>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSource {
    pub fn hourly(aqi: i64) -> Self {
        Self {
            aqi,
            failing: HashSet::new(),
            empty: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Fail the window starting at `start` with an upstream 503.
    pub fn failing_at(mut self, start: DateTime<Utc>) -> Self {
        self.failing.insert(start);
        self
    }

    /// Answer the window starting at `start` with no readings.
    pub fn empty_at(mut self, start: DateTime<Utc>) -> Self {
        self.empty.insert(start);
        self
    }

    pub fn calls(&self) -> Vec<TimeWindow> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn reading(&self, dt: DateTime<Utc>) -> Reading {
        let hour = dt.timestamp() / 3600 % 24;
        Reading {
            dt: dt.timestamp(),
            main: ReadingMain { aqi: self.aqi },
            components: Components {
                co: 200.0 + hour as f64,
                no: 0.5,
                no2: 10.0,
                o3: 60.0,
                so2: 1.5,
                pm2_5: 12.0 + self.aqi as f64,
                pm10: 20.0,
                nh3: 0.25,
            },
        }
    }
}

#[async_trait]
impl PollutionSource for FakeSource {
    async fn readings(
        &self,
        _coords: Coordinates,
        window: &TimeWindow,
    ) -> Result<Vec<Reading>, AirError> {
        self.calls.lock().unwrap().push(*window);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&window.start) {
            return Err(AirError::UpstreamStatus(StatusCode::SERVICE_UNAVAILABLE));
        }
        if self.empty.contains(&window.start) {
            return Ok(Vec::new());
        }

        let mut readings = Vec::new();
        let mut dt = window.start;
        while dt < window.end {
            readings.push(self.reading(dt));
            dt += TimeDelta::hours(1);
        }
        Ok(readings)
    }
}

/// Delegates to a real store, failing selected writes.
pub struct FaultyStore {
    inner: Arc<dyn AirStore>,
    record_hour_step: Option<u32>,
    fail_place_delete: bool,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn AirStore>) -> Self {
        Self {
            inner,
            record_hour_step: None,
            fail_place_delete: false,
        }
    }

    /// Refuse `get_or_create` for every hour divisible by `step`.
    pub fn failing_record_hours(mut self, step: u32) -> Self {
        self.record_hour_step = Some(step);
        self
    }

    pub fn failing_place_delete(mut self) -> Self {
        self.fail_place_delete = true;
        self
    }
}

#[async_trait]
impl PlaceRegistry for FaultyStore {
    async fn resolve(&self, lat: f64, lon: f64) -> Result<Place, AirError> {
        self.inner.resolve(lat, lon).await
    }

    async fn find(&self, lat: f64, lon: f64) -> Result<Option<Place>, AirError> {
        self.inner.find(lat, lon).await
    }

    async fn delete_by_coordinates(&self, lat: f64, lon: f64) -> Result<u64, AirError> {
        if self.fail_place_delete {
            return Err(AirError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.delete_by_coordinates(lat, lon).await
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn get_or_create(
        &self,
        place: &Place,
        dt: DateTime<Utc>,
        measurement: Measurement,
    ) -> Result<(Record, bool), AirError> {
        if matches!(self.record_hour_step, Some(step) if dt.hour() % step == 0) {
            return Err(AirError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.get_or_create(place, dt, measurement).await
    }

    async fn query_average(
        &self,
        place: &Place,
        range: &TimeRange,
    ) -> Result<Option<PollutionAverage>, AirError> {
        self.inner.query_average(place, range).await
    }

    async fn query_worst_average_across_places(
        &self,
        range: &TimeRange,
    ) -> Result<Option<PlaceAverage>, AirError> {
        self.inner.query_worst_average_across_places(range).await
    }

    async fn delete_by_place(&self, place: &Place) -> Result<u64, AirError> {
        self.inner.delete_by_place(place).await
    }

    async fn count_for_place(&self, place: &Place) -> Result<i64, AirError> {
        self.inner.count_for_place(place).await
    }

    async fn list_for_place(&self, place: &Place) -> Result<Vec<Record>, AirError> {
        self.inner.list_for_place(place).await
    }
}

#[async_trait]
impl AirStore for FaultyStore {
    async fn init_schema(&self) -> Result<(), AirError> {
        self.inner.init_schema().await
    }
}
