use crate::db::models::{Place, PlaceAverage, Record};
use crate::db::repo::{AirStore, PlaceRegistry, RecordStore};
use crate::db::schema::SQLITE_INIT;
use crate::error::AirError;
use crate::types::{Measurement, PollutantFields, PollutionAverage, TimeRange};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub type SqlitePool = Pool<Sqlite>;

const RECORD_COLUMNS: &str =
    "id, dt, place_id, aqi, co, no, no_2, o_3, so_2, pm_2_5, pm_10, nh_3";

const AVERAGE_COLUMNS: &str = "COUNT(*) AS samples, AVG(r.aqi) AS aqi, AVG(r.co) AS co, \
     AVG(r.no) AS no, AVG(r.no_2) AS no_2, AVG(r.o_3) AS o_3, AVG(r.so_2) AS so_2, \
     AVG(r.pm_2_5) AS pm_2_5, AVG(r.pm_10) AS pm_10, AVG(r.nh_3) AS nh_3";

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and make sure
    /// the schema exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AirError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        // every connection to `:memory:` is its own database, so keep exactly one alive
        let in_memory = database_url.contains(":memory:");
        let mut pool_opts = SqlitePoolOptions::new();
        if in_memory {
            pool_opts = pool_opts
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            pool_opts = pool_opts.max_connections(max_connections.max(1));
        }

        let pool = pool_opts.connect_with(connect_opts).await?;
        let store = Self::new(pool);
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_record(&self, place_id: i64, dt: i64) -> Result<Record, AirError> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE place_id = ? AND dt = ?"
        ))
        .bind(place_id)
        .bind(dt)
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_record(row)
    }

    fn row_to_place(row: SqliteRow) -> Result<Place, AirError> {
        Ok(Place {
            id: row.try_get("id")?,
            lat: row.try_get("lat")?,
            lon: row.try_get("lon")?,
        })
    }

    fn row_to_record(row: SqliteRow) -> Result<Record, AirError> {
        let dt_secs: i64 = row.try_get("dt")?;
        Ok(Record {
            id: row.try_get("id")?,
            dt: from_unix(dt_secs)?,
            place_id: row.try_get("place_id")?,
            aqi: row.try_get("aqi")?,
            pollutants: Self::row_to_pollutants(&row)?,
        })
    }

    fn row_to_pollutants(row: &SqliteRow) -> Result<PollutantFields, AirError> {
        Ok(PollutantFields {
            co: row.try_get("co")?,
            no: row.try_get("no")?,
            no_2: row.try_get("no_2")?,
            o_3: row.try_get("o_3")?,
            so_2: row.try_get("so_2")?,
            pm_2_5: row.try_get("pm_2_5")?,
            pm_10: row.try_get("pm_10")?,
            nh_3: row.try_get("nh_3")?,
        })
    }

    /// `None` when the aggregate ran over zero rows.
    fn row_to_average(row: &SqliteRow) -> Result<Option<PollutionAverage>, AirError> {
        let samples: i64 = row.try_get("samples")?;
        if samples == 0 {
            return Ok(None);
        }
        Ok(Some(PollutionAverage {
            aqi: row.try_get("aqi")?,
            pollutants: Self::row_to_pollutants(row)?,
        }))
    }
}

/// Whole-second bound for the INTEGER `dt` column. Rounds up so that
/// `dt >= bound(from) AND dt < bound(to)` keeps `[from, to)` exact for
/// sub-second instants.
fn range_bound(t: DateTime<Utc>) -> i64 {
    t.timestamp() + i64::from(t.timestamp_subsec_nanos() > 0)
}

fn from_unix(secs: i64) -> Result<DateTime<Utc>, AirError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        AirError::Database(sqlx::Error::Decode(
            format!("timestamp out of range: {secs}").into(),
        ))
    })
}

#[async_trait]
impl PlaceRegistry for SqliteStore {
    async fn resolve(&self, lat: f64, lon: f64) -> Result<Place, AirError> {
        let inserted: Option<(i64,)> = sqlx::query_as(
            "INSERT INTO places (lat, lon) VALUES (?, ?) \
             ON CONFLICT(lat, lon) DO NOTHING RETURNING id",
        )
        .bind(lat)
        .bind(lon)
        .fetch_optional(&self.pool)
        .await?;

        if let Some((id,)) = inserted {
            debug!(place_id = id, lat, lon, "place created");
            return Ok(Place { id, lat, lon });
        }

        let row = sqlx::query("SELECT id, lat, lon FROM places WHERE lat = ? AND lon = ?")
            .bind(lat)
            .bind(lon)
            .fetch_one(&self.pool)
            .await?;
        Self::row_to_place(row)
    }

    async fn find(&self, lat: f64, lon: f64) -> Result<Option<Place>, AirError> {
        let row = sqlx::query("SELECT id, lat, lon FROM places WHERE lat = ? AND lon = ?")
            .bind(lat)
            .bind(lon)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_place).transpose()
    }

    async fn delete_by_coordinates(&self, lat: f64, lon: f64) -> Result<u64, AirError> {
        let res = sqlx::query("DELETE FROM places WHERE lat = ? AND lon = ?")
            .bind(lat)
            .bind(lon)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get_or_create(
        &self,
        place: &Place,
        dt: DateTime<Utc>,
        measurement: Measurement,
    ) -> Result<(Record, bool), AirError> {
        let p = measurement.pollutants;
        let dt_secs = dt.timestamp();
        let inserted: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO records (
                dt, place_id, aqi, co, no, no_2, o_3, so_2, pm_2_5, pm_10, nh_3
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(place_id, dt) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(dt_secs)
        .bind(place.id)
        .bind(measurement.aqi)
        .bind(p.co)
        .bind(p.no)
        .bind(p.no_2)
        .bind(p.o_3)
        .bind(p.so_2)
        .bind(p.pm_2_5)
        .bind(p.pm_10)
        .bind(p.nh_3)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some((id,)) => Ok((
                Record {
                    id,
                    dt: from_unix(dt_secs)?,
                    place_id: place.id,
                    aqi: measurement.aqi,
                    pollutants: p,
                },
                true,
            )),
            None => Ok((self.fetch_record(place.id, dt_secs).await?, false)),
        }
    }

    async fn query_average(
        &self,
        place: &Place,
        range: &TimeRange,
    ) -> Result<Option<PollutionAverage>, AirError> {
        let row = sqlx::query(&format!(
            "SELECT {AVERAGE_COLUMNS} FROM records r \
             WHERE r.place_id = ? AND r.dt >= ? AND r.dt < ?"
        ))
        .bind(place.id)
        .bind(range_bound(range.from()))
        .bind(range_bound(range.to()))
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_average(&row)
    }

    async fn query_worst_average_across_places(
        &self,
        range: &TimeRange,
    ) -> Result<Option<PlaceAverage>, AirError> {
        let row = sqlx::query(&format!(
            "SELECT p.id AS place_id, p.lat AS lat, p.lon AS lon, {AVERAGE_COLUMNS} \
             FROM records r JOIN places p ON p.id = r.place_id \
             WHERE r.dt >= ? AND r.dt < ? \
             GROUP BY p.id \
             ORDER BY AVG(r.aqi) DESC, p.id ASC \
             LIMIT 1"
        ))
        .bind(range_bound(range.from()))
        .bind(range_bound(range.to()))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Some(avg) = Self::row_to_average(&row)? else {
            return Ok(None);
        };
        Ok(Some(PlaceAverage {
            place: Place {
                id: row.try_get("place_id")?,
                lat: row.try_get("lat")?,
                lon: row.try_get("lon")?,
            },
            samples: row.try_get("samples")?,
            aqi: avg.aqi,
            pollutants: avg.pollutants,
        }))
    }

    async fn delete_by_place(&self, place: &Place) -> Result<u64, AirError> {
        let res = sqlx::query("DELETE FROM records WHERE place_id = ?")
            .bind(place.id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn count_for_place(&self, place: &Place) -> Result<i64, AirError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records WHERE place_id = ?")
            .bind(place.id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_for_place(&self, place: &Place) -> Result<Vec<Record>, AirError> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE place_id = ? ORDER BY dt"
        ))
        .bind(place.id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_record).collect()
    }
}

#[async_trait]
impl AirStore for SqliteStore {
    async fn init_schema(&self) -> Result<(), AirError> {
        // sqlx::query runs a single statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }
}
