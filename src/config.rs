use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Runtime configuration, layered as: defaults < `AIRQ_*` env < `OPENWEATHERMAP_API_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub openweathermap_api_key: String,
    pub openweathermap_base_url: Url,
    pub proxy: Option<Url>,
    pub loglevel: String,
    pub listen_addr: String,
    /// Upstream quota shared by geocoding and pollution calls.
    pub requests_per_minute: u32,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub geocode_retries: usize,
    /// Max in-flight record writes inside a single window.
    pub record_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/airq.sqlite".to_string(),
            database_max_connections: 5,
            openweathermap_api_key: String::new(),
            openweathermap_base_url: Url::parse("https://api.openweathermap.org/")
                .expect("static base url is valid"),
            proxy: None,
            loglevel: "info".to_string(),
            listen_addr: "0.0.0.0:8000".to_string(),
            requests_per_minute: 60,
            request_timeout_secs: 15,
            connect_timeout_secs: 5,
            geocode_retries: 2,
            record_concurrency: 8,
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("AIRQ_"))
            .merge(Env::raw().only(&["OPENWEATHERMAP_API_KEY"]))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}
