use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum AirError {
    #[error("could not find coordinates for city `{0}`")]
    CityNotFound(String),

    #[error("city `{0}` has never been synced")]
    PlaceNotFound(String),

    #[error("no data found for the requested range")]
    NoDataFound,

    #[error("no records stored for city `{0}`")]
    NoRecordsFound(String),

    #[error("could not resolve a name for coordinates ({lat}, {lon})")]
    ReverseGeocodeFailed { lat: f64, lon: f64 },

    #[error("invalid range: `from` ({from}) must be earlier than `to` ({to})")]
    InvalidRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    #[error("invalid instant: {0}")]
    InvalidInstant(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AirError {
    /// Transport failures, rate limiting and upstream 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AirError::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AirError::UpstreamStatus(code) => {
                code.is_server_error() || *code == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

impl IntoResponse for AirError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            AirError::CityNotFound(_) => (
                StatusCode::NOT_FOUND,
                "CITY_NOT_FOUND",
                "Could not find city coordinates.".to_string(),
            ),
            AirError::PlaceNotFound(city) => (
                StatusCode::NOT_FOUND,
                "PLACE_NOT_FOUND",
                format!("Could not find {city} in the database."),
            ),
            AirError::NoDataFound => (
                StatusCode::NOT_FOUND,
                "NO_DATA",
                "Could not find data for the requested range.".to_string(),
            ),
            AirError::NoRecordsFound(city) => (
                StatusCode::NOT_FOUND,
                "NO_RECORDS",
                format!("There are no records in the database for {city}."),
            ),
            AirError::InvalidRange { .. } | AirError::InvalidInstant(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_QUERY",
                self.to_string(),
            ),
            AirError::ReverseGeocodeFailed { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERVER_ERROR",
                "Server Error. Could not find city name.".to_string(),
            ),
            AirError::Database(_) | AirError::Config(_) | AirError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal server error occurred.".to_string(),
            ),
            AirError::Reqwest(_) | AirError::UrlParse(_) | AirError::Json(_) => (
                StatusCode::BAD_GATEWAY,
                "BAD_GATEWAY",
                "Upstream service is unavailable.".to_string(),
            ),
            AirError::UpstreamStatus(code) => {
                let (err_code, msg) = match *code {
                    StatusCode::TOO_MANY_REQUESTS => {
                        ("RATE_LIMIT", "Upstream rate limit exceeded.")
                    }
                    StatusCode::UNAUTHORIZED => ("UNAUTHORIZED", "Upstream authentication failed."),
                    StatusCode::FORBIDDEN => ("FORBIDDEN", "Upstream permission denied."),
                    StatusCode::NOT_FOUND => ("NOT_FOUND", "Upstream resource not found."),
                    _ => ("UPSTREAM_ERROR", "An upstream error occurred."),
                };
                (*code, err_code, msg.to_string())
            }
        };
        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
