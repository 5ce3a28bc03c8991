use crate::api::{CoordinateResolver, PollutionSource};
use crate::config::Config;
use crate::error::AirError;
use crate::types::openweather::{AirPollutionResponse, GeoEntry};
use crate::types::{Coordinates, Reading, TimeWindow};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const GEO_DIRECT_PATH: &str = "geo/1.0/direct";
const GEO_REVERSE_PATH: &str = "geo/1.0/reverse";
const POLLUTION_HISTORY_PATH: &str = "data/2.5/air_pollution/history";

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Stateless OpenWeatherMap caller. Cloning shares the HTTP pool and the
/// request quota.
#[derive(Clone)]
pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: Arc<str>,
    limiter: Arc<DirectLimiter>,
    geocode_retries: usize,
}

impl OpenWeatherMapClient {
    pub fn new(cfg: &Config) -> Result<Self, AirError> {
        if cfg.openweathermap_api_key.trim().is_empty() {
            return Err(AirError::Config(
                "OPENWEATHERMAP_API_KEY is not set".to_string(),
            ));
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("airq-ledger/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.request_timeout_secs));
        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }
        let client = builder.build()?;

        let per_minute = NonZeroU32::new(cfg.requests_per_minute).ok_or_else(|| {
            AirError::Config("requests_per_minute must be greater than zero".to_string())
        })?;

        Ok(Self {
            client,
            base_url: cfg.openweathermap_base_url.clone(),
            api_key: Arc::from(cfg.openweathermap_api_key.as_str()),
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
            geocode_retries: cfg.geocode_retries,
        })
    }

    fn retry_policy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(3))
            .with_max_times(self.geocode_retries)
            .with_jitter()
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, AirError> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("appid", &self.api_key);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, AirError> {
        self.limiter.until_ready().await;
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AirError::UpstreamStatus(status));
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn geocode(&self, url: Url) -> Result<Vec<GeoEntry>, AirError> {
        (|| async { self.get_json::<Vec<GeoEntry>>(url.clone()).await })
            .retry(self.retry_policy())
            .when(|e: &AirError| e.is_retryable())
            .notify(|err, dur: Duration| {
                warn!("geocoding retrying after error {}, sleeping {:?}", err, dur);
            })
            .await
    }
}

#[async_trait]
impl CoordinateResolver for OpenWeatherMapClient {
    async fn coordinates(&self, city: &str) -> Result<Option<Coordinates>, AirError> {
        let url = self.endpoint(
            GEO_DIRECT_PATH,
            &[("q", city.to_string()), ("limit", "1".to_string())],
        )?;
        let entries = self.geocode(url).await?;
        debug!(city, matches = entries.len(), "direct geocoding done");
        Ok(entries.first().map(GeoEntry::coordinates))
    }

    async fn name(&self, coords: Coordinates) -> Result<Option<String>, AirError> {
        let url = self.endpoint(
            GEO_REVERSE_PATH,
            &[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("limit", "1".to_string()),
            ],
        )?;
        let entries = self.geocode(url).await?;
        Ok(entries.into_iter().next().map(|e| e.name))
    }
}

#[async_trait]
impl PollutionSource for OpenWeatherMapClient {
    /// Single attempt; a failed window is reported, never retried here.
    async fn readings(
        &self,
        coords: Coordinates,
        window: &TimeWindow,
    ) -> Result<Vec<Reading>, AirError> {
        let url = self.endpoint(
            POLLUTION_HISTORY_PATH,
            &[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("start", window.start.timestamp().to_string()),
                ("end", window.end.timestamp().to_string()),
            ],
        )?;
        let body: AirPollutionResponse = self.get_json(url).await?;
        Ok(body.list)
    }
}
