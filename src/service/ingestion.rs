//! Sync one city over one date range.
//!
//! `Resolving -> PerWindow(0..n) -> Completed`, with `Aborted(CityNotFound)`
//! reachable only while resolving (returned as `Err`). Windows never run
//! concurrently with each other; records inside a window may.

use crate::api::{CoordinateResolver, PollutionSource};
use crate::db::{AirStore, Place, Record};
use crate::error::AirError;
use crate::service::windows::partition;
use crate::types::{Coordinates, Measurement, Reading, TimeRange, TimeWindow};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// In-flight windows per run. The history API is rate limited; keep at one.
pub const WINDOW_CONCURRENCY: usize = 1;

/// Result of persisting a single reading.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Created(Record),
    /// A record for the same `(place, dt)` was already stored and left as is.
    Existing(Record),
    Failed { dt: i64, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistSummary {
    pub created: usize,
    pub existing: usize,
    pub failed: usize,
}

impl PersistSummary {
    fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Created(_) => self.created += 1,
            RecordOutcome::Existing(_) => self.existing += 1,
            RecordOutcome::Failed { .. } => self.failed += 1,
        }
    }

    fn merge(&mut self, other: &PersistSummary) {
        self.created += other.created;
        self.existing += other.existing;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WindowOutcome {
    Persisted(PersistSummary),
    /// The source answered with zero readings.
    Empty,
    /// The source call failed; later windows still run.
    FetchFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowReport {
    pub index: usize,
    pub window: TimeWindow,
    pub outcome: WindowOutcome,
}

/// What a completed run did, window by window in chronological order.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub city: String,
    pub place: Place,
    pub range: TimeRange,
    pub windows: Vec<WindowReport>,
}

impl SyncReport {
    pub fn totals(&self) -> PersistSummary {
        let mut totals = PersistSummary::default();
        for report in &self.windows {
            if let WindowOutcome::Persisted(summary) = &report.outcome {
                totals.merge(summary);
            }
        }
        totals
    }

    pub fn failed_windows(&self) -> usize {
        self.count_windows(|o| matches!(o, WindowOutcome::FetchFailed { .. }))
    }

    pub fn empty_windows(&self) -> usize {
        self.count_windows(|o| matches!(o, WindowOutcome::Empty))
    }

    fn count_windows(&self, pred: impl Fn(&WindowOutcome) -> bool) -> usize {
        self.windows.iter().filter(|r| pred(&r.outcome)).count()
    }
}

pub struct IngestionPipeline {
    resolver: Arc<dyn CoordinateResolver>,
    source: Arc<dyn PollutionSource>,
    store: Arc<dyn AirStore>,
    record_concurrency: usize,
}

impl IngestionPipeline {
    pub fn new(
        resolver: Arc<dyn CoordinateResolver>,
        source: Arc<dyn PollutionSource>,
        store: Arc<dyn AirStore>,
        record_concurrency: usize,
    ) -> Self {
        Self {
            resolver,
            source,
            store,
            record_concurrency: record_concurrency.max(1),
        }
    }

    pub async fn sync(&self, city: &str, range: TimeRange) -> Result<SyncReport, AirError> {
        info!(city, range = %range, "syncing data");

        let Some(coords) = self.resolver.coordinates(city).await? else {
            warn!(city, "could not find city");
            return Err(AirError::CityNotFound(city.to_string()));
        };
        info!(city, lat = coords.lat, lon = coords.lon, "found coordinates");

        let place = self.store.resolve(coords.lat, coords.lon).await?;

        let windows = partition(&range);
        let total = windows.len();
        let reports: Vec<WindowReport> = stream::iter(windows.into_iter().enumerate())
            .map(|(index, window)| self.sync_window(&place, index, total, window))
            .buffered(WINDOW_CONCURRENCY)
            .collect()
            .await;

        let report = SyncReport {
            city: city.to_string(),
            place,
            range,
            windows: reports,
        };
        let totals = report.totals();
        info!(
            city,
            place_id = place.id,
            windows = total,
            failed_windows = report.failed_windows(),
            empty_windows = report.empty_windows(),
            created = totals.created,
            existing = totals.existing,
            failed = totals.failed,
            "sync completed"
        );
        Ok(report)
    }

    async fn sync_window(
        &self,
        place: &Place,
        index: usize,
        total: usize,
        window: TimeWindow,
    ) -> WindowReport {
        info!(
            window = index + 1,
            of = total,
            start = %window.start,
            end = %window.end,
            "fetching batch data"
        );

        let coords = Coordinates::new(place.lat, place.lon);
        let outcome = match self.source.readings(coords, &window).await {
            Err(e) => {
                warn!(window = index + 1, error = %e, "could not fetch pollution data, skipping window");
                WindowOutcome::FetchFailed {
                    reason: e.to_string(),
                }
            }
            Ok(readings) if readings.is_empty() => {
                warn!(window = index + 1, "no pollution data for window, skipping");
                WindowOutcome::Empty
            }
            Ok(readings) => {
                let fetched = readings.len();
                let summary = self.persist(place, readings).await;
                info!(
                    window = index + 1,
                    fetched,
                    created = summary.created,
                    existing = summary.existing,
                    failed = summary.failed,
                    "window persisted"
                );
                WindowOutcome::Persisted(summary)
            }
        };

        WindowReport {
            index,
            window,
            outcome,
        }
    }

    async fn persist(&self, place: &Place, readings: Vec<Reading>) -> PersistSummary {
        stream::iter(readings)
            .map(|reading| self.persist_one(place, reading))
            .buffer_unordered(self.record_concurrency)
            .fold(PersistSummary::default(), |mut summary, outcome| async move {
                summary.record(&outcome);
                summary
            })
            .await
    }

    async fn persist_one(&self, place: &Place, reading: Reading) -> RecordOutcome {
        let Some(dt) = DateTime::<Utc>::from_timestamp(reading.dt, 0) else {
            warn!(dt = reading.dt, "reading timestamp out of range, skipping");
            return RecordOutcome::Failed {
                dt: reading.dt,
                reason: "timestamp out of range".to_string(),
            };
        };

        match self
            .store
            .get_or_create(place, dt, Measurement::from(&reading))
            .await
        {
            Ok((record, true)) => {
                debug!(record_id = record.id, dt = %dt, "record created");
                RecordOutcome::Created(record)
            }
            Ok((record, false)) => {
                debug!(record_id = record.id, dt = %dt, "record already stored");
                RecordOutcome::Existing(record)
            }
            Err(e) => {
                warn!(dt = %dt, error = %e, "could not save record, skipping");
                RecordOutcome::Failed {
                    dt: reading.dt,
                    reason: e.to_string(),
                }
            }
        }
    }
}
