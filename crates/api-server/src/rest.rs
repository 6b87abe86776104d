//! Shared handler state and operational endpoints.

use crate::geo_proxy::GeoProxy;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use dinehub_core::{AppConfig, RequestContext, StoreFilter};
use dinehub_loyalty::InsightsService;
use dinehub_store::{MemoryOrderStore, OrderSource};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub node_id: String,
    pub start_time: Instant,
    pub config: Arc<AppConfig>,
    pub orders: Arc<MemoryOrderStore>,
    pub insights: Arc<InsightsService>,
    pub geo: Arc<GeoProxy>,
}

impl AppState {
    pub fn new(config: AppConfig, orders: Arc<MemoryOrderStore>) -> Self {
        let source: Arc<dyn OrderSource> = orders.clone();
        let insights = Arc::new(InsightsService::new(
            source,
            &config.loyalty,
            Duration::from_millis(config.store.fetch_timeout_ms),
        ));
        let geo = Arc::new(GeoProxy::new(config.geo.clone()));
        Self {
            node_id: config.node_id.clone(),
            start_time: Instant::now(),
            config: Arc::new(config),
            orders,
            insights,
            geo,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.config.store.fetch_timeout_ms)
    }

    pub fn placeholder_name(&self) -> &str {
        &self.config.loyalty.default_customer_name
    }
}

/// `?store=&user=` query accepted by every read endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub store: Option<String>,
    pub user: Option<String>,
}

impl ScopeQuery {
    pub fn context(&self) -> RequestContext {
        RequestContext {
            user_id: self.user.clone(),
            store: StoreFilter::parse(self.store.as_deref()),
        }
    }
}

/// GET /health — Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        orders: state.orders.len(),
    })
}

/// GET /ready — Readiness probe. Fails while the last insights fetch could not reach the store.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.insights.last_fetch_failed() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// GET /live — Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
    pub orders: usize,
}
