//! Map and local-search proxy.
//!
//! Forwards geocoding, reverse geocoding, driving directions and local search
//! to the upstream map APIs so their credentials never reach the browser.

use crate::error::ApiError;
use crate::rest::AppState;
use axum::extract::{Query, State};
use axum::Json;
use dinehub_core::config::GeoConfig;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const GEOCODE_PATH: &str = "/map-geocode/v2/geocode";
const REVERSE_GEOCODE_PATH: &str = "/map-reversegeocode/v2/gc";
const DIRECTIONS_PATH: &str = "/map-direction/v1/driving";
const LOCAL_SEARCH_PATH: &str = "/v1/search/local.json";

/// Which upstream API a call targets; each has its own credential pair.
#[derive(Debug, Clone, Copy)]
enum Upstream {
    Map,
    Search,
}

pub struct GeoProxy {
    client: reqwest::Client,
    config: GeoConfig,
    timeout: Duration,
}

impl GeoProxy {
    pub fn new(config: GeoConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(config.timeout_ms),
            config,
        }
    }

    fn credentials(&self, upstream: Upstream) -> Result<(&str, &str), ApiError> {
        let (id, secret, what) = match upstream {
            Upstream::Map => (
                &self.config.map_client_id,
                &self.config.map_client_secret,
                "map API credentials are not configured (geo.map_client_id / geo.map_client_secret)",
            ),
            Upstream::Search => (
                &self.config.search_client_id,
                &self.config.search_client_secret,
                "search API credentials are not configured (geo.search_client_id / geo.search_client_secret)",
            ),
        };
        match (non_empty(id), non_empty(secret)) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(ApiError::Precondition(what.to_string())),
        }
    }

    async fn forward(
        &self,
        upstream: Upstream,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let (id, secret) = self.credentials(upstream)?;
        let (base, id_header, secret_header) = match upstream {
            Upstream::Map => (
                &self.config.map_base_url,
                "X-NCP-APIGW-API-KEY-ID",
                "X-NCP-APIGW-API-KEY",
            ),
            Upstream::Search => (
                &self.config.search_base_url,
                "X-Naver-Client-Id",
                "X-Naver-Client-Secret",
            ),
        };
        let url = format!("{}{}", base.trim_end_matches('/'), path);

        let resp = self
            .client
            .get(&url)
            .query(params)
            .header(id_header, id)
            .header(secret_header, secret)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                metrics::counter!("geo.upstream_errors", "kind" => "request").increment(1);
                ApiError::Upstream(format!("request to {path} failed: {e}"))
            })?;

        let status = resp.status();
        if !status.is_success() {
            metrics::counter!("geo.upstream_errors", "kind" => "status").increment(1);
            warn!(path, status = status.as_u16(), "Upstream map API rejected the request");
            return Err(ApiError::Upstream(format!("{path} answered {status}")));
        }

        debug!(path, "Upstream map API call succeeded");
        resp.json::<Value>()
            .await
            .map_err(|e| ApiError::Upstream(format!("unreadable response from {path}: {e}")))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required<'a>(value: &'a Option<String>, names: &str) -> Result<&'a str, ApiError> {
    non_empty(value).ok_or_else(|| ApiError::Validation(format!("{names} parameter is required")))
}

#[derive(Debug, Default, Deserialize)]
pub struct GeocodeQuery {
    pub query: Option<String>,
}

/// GET /v1/geo/geocode?query= — Address to coordinates.
pub async fn handle_geocode(
    State(state): State<AppState>,
    Query(q): Query<GeocodeQuery>,
) -> Result<Json<Value>, ApiError> {
    let query = required(&q.query, "query")?;
    metrics::counter!("geo.api.geocode").increment(1);
    let data = state
        .geo
        .forward(Upstream::Map, GEOCODE_PATH, &[("query", query)])
        .await?;
    Ok(Json(data))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReverseGeocodeQuery {
    pub coords: Option<String>,
}

/// GET /v1/geo/reverse-geocode?coords=lng,lat — Coordinates to address.
pub async fn handle_reverse_geocode(
    State(state): State<AppState>,
    Query(q): Query<ReverseGeocodeQuery>,
) -> Result<Json<Value>, ApiError> {
    let coords = required(&q.coords, "coords")?;
    let params = [("coords", coords), ("orders", "addr,legalcode"), ("output", "json")];
    let data = state
        .geo
        .forward(Upstream::Map, REVERSE_GEOCODE_PATH, &params)
        .await?;
    Ok(Json(data))
}

#[derive(Debug, Default, Deserialize)]
pub struct DirectionsQuery {
    pub start: Option<String>,
    pub goal: Option<String>,
    pub option: Option<String>,
}

/// GET /v1/geo/directions?start=&goal=&option= — Driving route.
pub async fn handle_directions(
    State(state): State<AppState>,
    Query(q): Query<DirectionsQuery>,
) -> Result<Json<Value>, ApiError> {
    let (start, goal) = match (non_empty(&q.start), non_empty(&q.goal)) {
        (Some(start), Some(goal)) => (start, goal),
        _ => return Err(ApiError::Validation("start, goal parameters are required".into())),
    };
    let option = non_empty(&q.option).unwrap_or("trafast");
    let params = [("start", start), ("goal", goal), ("option", option)];
    let data = state
        .geo
        .forward(Upstream::Map, DIRECTIONS_PATH, &params)
        .await?;
    Ok(Json(data))
}

#[derive(Debug, Default, Deserialize)]
pub struct LocalSearchQuery {
    pub query: Option<String>,
    pub display: Option<String>,
}

/// GET /v1/geo/search/local?query=&display= — Place search.
pub async fn handle_local_search(
    State(state): State<AppState>,
    Query(q): Query<LocalSearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let query = required(&q.query, "query")?;
    let display = non_empty(&q.display).unwrap_or("5");
    let params = [("query", query), ("display", display)];
    let data = state
        .geo
        .forward(Upstream::Search, LOCAL_SEARCH_PATH, &params)
        .await?;
    Ok(Json(data))
}
