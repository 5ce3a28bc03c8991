use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::collections::HashMap;

use crate::types::TimeRange;

/// `?city=..&from=..&to=..`
#[derive(Debug, Clone)]
pub struct CityRangeQuery {
    pub city: String,
    pub range: TimeRange,
}

/// `?from=..&to=..`
#[derive(Debug, Clone)]
pub struct RangeQuery {
    pub range: TimeRange,
}

fn query_params(parts: &Parts) -> HashMap<String, String> {
    let Some(qs) = parts.uri.query() else {
        return HashMap::new();
    };
    url::form_urlencoded::parse(qs.as_bytes())
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// 422 listing which of the expected variables were absent.
fn missing_variables(params: &HashMap<String, String>, names: &[&str]) -> Option<Response> {
    if names.iter().all(|n| params.contains_key(*n)) {
        return None;
    }
    let missing: serde_json::Map<String, serde_json::Value> = names
        .iter()
        .map(|n| (n.to_string(), json!(!params.contains_key(*n))))
        .collect();
    Some(
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": {
                    "code": "MISSING_QUERY",
                    "message": "Missing required query variables",
                },
                "missingVariables": missing,
            })),
        )
            .into_response(),
    )
}

fn parse_range(params: &HashMap<String, String>) -> Result<TimeRange, Response> {
    TimeRange::parse(&params["from"], &params["to"]).map_err(IntoResponse::into_response)
}

impl<S> FromRequestParts<S> for CityRangeQuery
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut params = query_params(parts);
        if let Some(rejection) = missing_variables(&params, &["city", "from", "to"]) {
            return Err(rejection);
        }
        let range = parse_range(&params)?;
        let city = params.remove("city").unwrap_or_default();
        Ok(Self { city, range })
    }
}

impl<S> FromRequestParts<S> for RangeQuery
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let params = query_params(parts);
        if let Some(rejection) = missing_variables(&params, &["from", "to"]) {
            return Err(rejection);
        }
        Ok(Self {
            range: parse_range(&params)?,
        })
    }
}
